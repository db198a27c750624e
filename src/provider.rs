//! Transport acquisition with legacy fallback.
//!
//! The provider resolves which native transport to instantiate for the
//! current runtime: the standard constructor first, then each known legacy
//! constructor identifier, then the mobile HTTP client. If nothing can be
//! constructed, the caller sees the *original* standard-transport failure,
//! not whichever legacy attempt happened to fail last.

use std::time::Duration;

use log::debug;

use crate::guard::PollGuard;
use crate::transport::{Runtime, Transport};
use crate::Error;

/// Legacy constructor identifiers, newest capability first.
pub const LEGACY_FALLBACK_ORDER: &[&str] = &[
    "Msxml2.XMLHTTP.6.0",
    "Msxml2.XMLHTTP.3.0",
    "Microsoft.XMLHTTP",
];

/// Poll budget for the mobile transport's unreliable error signal.
pub const MOBILE_POLL_ATTEMPTS: u32 = 10;

/// Delay between poll attempts.
pub const MOBILE_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// A freshly constructed transport, plus the poll guard when the runtime's
/// error notification path needs one.
pub struct Acquired {
    /// The transport handle. Exclusively owned by one lifecycle.
    pub transport: Box<dyn Transport>,

    /// Present only for the mobile transport, which reports errors through
    /// an intermediate loading state without a reliable terminal event.
    pub guard: Option<PollGuard>,
}

/// Resolve a transport for the given runtime.
pub fn acquire(runtime: &dyn Runtime) -> Result<Acquired, Error> {
    let original = match runtime.create_standard() {
        Ok(transport) => {
            return Ok(Acquired {
                transport,
                guard: None,
            })
        }
        Err(e) => e,
    };

    if runtime.has_legacy_family() {
        for ident in LEGACY_FALLBACK_ORDER {
            match runtime.create_legacy(ident) {
                Ok(transport) => {
                    debug!("standard transport failed, using legacy {}", ident);
                    return Ok(Acquired {
                        transport,
                        guard: None,
                    });
                }
                Err(e) => debug!("legacy {} failed: {}", ident, e),
            }
        }
    }

    if let Some(transport) = runtime.create_mobile() {
        debug!("using mobile transport with poll guard");
        return Ok(Acquired {
            transport,
            guard: Some(PollGuard::new(MOBILE_POLL_ATTEMPTS, MOBILE_POLL_INTERVAL)),
        });
    }

    Err(original)
}
