//! # Fiscal Gateway
//!
//! Regime adapters turning a frozen invoice snapshot into a signed,
//! authenticated submission to the tax authority.
//!
//! ## Pipeline
//!
//! ```text
//! fiscalize(invoice) = parse(send(sign(build(invoice))))
//! ```
//!
//! Two regimes share that shape but differ in every stage:
//!
//! | Stage | Retail (F1) | Wholesale (F2) |
//! |-------|-------------|----------------|
//! | build | `RacunZahtjev` XML, fixed element order, `ZastKod` | JSON object, `version: "2.0"` |
//! | sign  | enveloped XML-DSig + SOAP wrap | optional HS256 bearer token |
//! | send  | POST `text/xml` | POST `application/json` |
//! | parse | `RacunOdgovor` / `Jir` | `status` / `fiscal_id` |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! adapters/ - RegimeAdapter variants + reqwest transport
//! ports/    - Transport and Clock outbound traits
//! domain/   - builders, security code, XML-DSig, SOAP, JWT, parsers
//! ```
//!
//! Sandbox mode is handled inside each adapter: deterministic stub
//! responses, no signature, no network traffic.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::{HttpTransport, RegimeAdapter, RetailAdapter, WholesaleAdapter};
pub use domain::entities::{ConnectionTest, FiscalOutcome, RawResponse, SignedPayload, WireRequest};
pub use ports::outbound::{Clock, FixedClock, SystemClock, Transport};
