//! Request dispatch.
//!
//! Every path is served by the same fallback handler; only the method
//! matters. `POST` pops a code, `OPTIONS` answers the CORS preflight, and
//! anything else is refused with `405`.

use crate::server::{
    service::{
        dispenser::{Dispenser, Store},
        response::{ApiError, Dispensed, method_not_allowed, preflight},
    },
    telemetry::{increment_codes_dispensed, increment_requests, record_pop_duration},
};
use axum::{
    Router,
    extract::State,
    http::Method,
    response::{IntoResponse, Response},
};
use codepool::KvStore;
use std::time::Instant;
use tower_http::trace::TraceLayer;

pub struct AppState<S = Store> {
    dispenser: Dispenser<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            dispenser: self.dispenser.clone(),
        }
    }
}

/// Builds the application router around `dispenser`.
pub fn router<S>(dispenser: Dispenser<S>) -> Router
where
    S: KvStore + 'static,
{
    Router::new()
        .fallback(dispatch::<S>)
        .with_state(AppState { dispenser })
        .layer(TraceLayer::new_for_http())
}

async fn dispatch<S>(State(state): State<AppState<S>>, method: Method) -> Response
where
    S: KvStore + 'static,
{
    match method {
        Method::OPTIONS => preflight(),
        Method::POST => pop(&state.dispenser).await,
        _ => method_not_allowed(),
    }
}

#[tracing::instrument(skip_all)]
async fn pop<S>(dispenser: &Dispenser<S>) -> Response
where
    S: KvStore + 'static,
{
    let start = Instant::now();
    increment_requests();

    let result = dispenser.pop_code().await;
    record_pop_duration(start.elapsed().as_secs_f64() * 1000.0);

    match result {
        Ok(code) => {
            increment_codes_dispensed();
            tracing::debug!(%code, "Dispensed code");
            Dispensed(code).into_response()
        }
        Err(e) => ApiError(e).into_response(),
    }
}
