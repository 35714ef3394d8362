//! Source abstraction between coordinator and API client
//!
//! The coordinator only needs "fetch one snapshot, session recovery
//! included". The trait keeps it testable against scripted doubles.
//! Uses a `Pin<Box<dyn Future>>` return type for dyn-compatibility.

use std::future::Future;
use std::pin::Pin;

use gym_api::{ApiError, BusynessSnapshot, GymApiClient};

/// One authenticated busyness fetch.
///
/// `&mut self` because a fetch may rotate the session identity token as a
/// side effect of expiry recovery.
pub trait BusynessSource: Send {
    fn fetch(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<BusynessSnapshot, ApiError>> + Send + '_>>;
}

impl BusynessSource for GymApiClient {
    fn fetch(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Result<BusynessSnapshot, ApiError>> + Send + '_>> {
        Box::pin(self.get_busyness())
    }
}
