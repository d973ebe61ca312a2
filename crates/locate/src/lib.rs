//! Finding the user, and finding places, for PawFinder.
//!
//! - [`LocationChain`]: high-accuracy device, then low-accuracy device, then
//!   IP lookup, each with its own timeout
//! - [`LocationState`]: observable "where is the user" that ignores stale answers
//! - [`DebouncedSearch`]: place-name search that only sends the latest query
//!
//! Device access and lookup services sit behind traits so hosts without
//! location hardware, and tests, can plug in their own.
//!
//! # Example
//!
//! ```no_run
//! use pawfinder_locate::{ChainTimeouts, IpApiLocator, LocationChain, NoDevice};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> pawfinder_locate::Result<()> {
//! let ip = IpApiLocator::new("https://ipapi.co/json/", Duration::from_secs(8))?;
//! let chain = LocationChain::new(Arc::new(NoDevice), Arc::new(ip), ChainTimeouts::default());
//!
//! let located = chain.locate().await?;
//! println!("{located}");
//! # Ok(())
//! # }
//! ```

mod chain;
mod error;
mod generation;
pub mod places;
mod providers;
mod state;

pub use chain::{ChainTimeouts, Located, LocationChain, LocationRequest, Provenance};
pub use error::{LocateError, Result, Stage, StageFailure};
pub use generation::{Generation, Ticket};
pub use places::{DebouncedSearch, NominatimSearcher, Place, PlaceResults, PlaceSearcher};
pub use providers::{DeviceLocator, FixedDevice, IpApiLocator, IpLocation, IpLocator, NoDevice};
pub use state::{LocationState, LocationStatus};
