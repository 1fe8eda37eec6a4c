//! Session lifecycle and negotiation counters, exposed through metriken.

use metriken::{Counter, metric};

#[metric(
    name = "filament/sessions/opened",
    description = "Total transport sessions opened"
)]
pub static SESSIONS_OPENED: Counter = Counter::new();

#[metric(
    name = "filament/sessions/closed",
    description = "Total transport sessions closed"
)]
pub static SESSIONS_CLOSED: Counter = Counter::new();

#[metric(
    name = "filament/tls/handshakes_completed",
    description = "TLS handshakes completed"
)]
pub static HANDSHAKES_COMPLETED: Counter = Counter::new();

#[metric(
    name = "filament/tls/handshake_failures",
    description = "TLS handshakes that failed before completion"
)]
pub static HANDSHAKE_FAILURES: Counter = Counter::new();

#[metric(
    name = "filament/alpn/defaulted",
    description = "Negotiations that fell back to the default protocol"
)]
pub static NEGOTIATION_DEFAULTED: Counter = Counter::new();
