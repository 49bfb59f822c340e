//! Outbound port traits required by the regime adapters.

pub mod outbound;
