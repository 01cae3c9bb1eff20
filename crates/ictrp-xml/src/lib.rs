//! XML on both ends of the ICTRP pipeline.
//!
//! Reads the ICTRP "Trials downloaded" export with `quick-xml`'s streaming
//! reader, and writes the weekly trend chart as SVG with its writer API.
//! Pure synchronous; no file-system access beyond the reader handed in.
//!
//! # Quick start
//!
//! ```no_run
//! let xml = std::fs::read("ICTRP-Results_18Mar2020.xml").unwrap();
//! let trials = ictrp_xml::parse_export(xml.as_slice()).unwrap();
//! println!("{} trials", trials.len());
//! ```

pub mod error;
mod export;
mod svg;

pub use error::{Error, Result};
pub use export::{ROOT_ELEMENT, TRIAL_ELEMENT, parse_export};
pub use svg::{ChartOptions, render_trend_chart};
