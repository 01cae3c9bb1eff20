//! Streaming reader for the ICTRP export.
//!
//! Layout:
//!   <Trials_downloaded_from_ICTRP>
//!     <Trial>
//!       <TrialID>NCT04280705</TrialID>
//!       <Source_Register>ClinicalTrials.gov</Source_Register>
//!       ...
//!     </Trial>
//!     ...
//!   </Trials_downloaded_from_ICTRP>
//!
//! Only the direct children of `<Trial>` named by [`TrialField`] are kept.

use std::io::BufRead;

use ictrp_core::trial::{RawTrial, TrialField};
use quick_xml::{Reader, events::Event};

use crate::error::{Error, Result};

pub const ROOT_ELEMENT: &str = "Trials_downloaded_from_ICTRP";
pub const TRIAL_ELEMENT: &str = "Trial";

/// Parser position inside the document.
enum State {
  /// Before the root element.
  Prolog,
  /// Inside the root, between trials.
  Root,
  /// Inside a `<Trial>`. `depth` counts open elements below it.
  Trial {
    raw:   RawTrial,
    depth: usize,
    field: Option<TrialField>,
    text:  String,
  },
}

/// Parse an entire export into raw trial rows, in document order.
pub fn parse_export<R: BufRead>(input: R) -> Result<Vec<RawTrial>> {
  let mut reader = Reader::from_reader(input);
  reader.config_mut().trim_text(true);

  let mut buf = Vec::new();
  let mut trials = Vec::new();
  let mut state = State::Prolog;

  loop {
    let event = reader
      .read_event_into(&mut buf)
      .map_err(|e| xml_error(&reader, e))?;
    let mut next = None;

    match &mut state {
      State::Prolog => match event {
        Event::Start(e) => {
          check_root(e.local_name().as_ref())?;
          next = Some(State::Root);
        }
        Event::Empty(e) => {
          check_root(e.local_name().as_ref())?;
          // An export with zero trials.
          return Ok(trials);
        }
        Event::Eof => return Err(Error::EmptyDocument),
        _ => {}
      },

      State::Root => match event {
        Event::Start(e) if e.local_name().as_ref() == TRIAL_ELEMENT.as_bytes() => {
          next = Some(State::Trial {
            raw:   RawTrial::default(),
            depth: 0,
            field: None,
            text:  String::new(),
          });
        }
        Event::Start(e) => {
          reader
            .read_to_end_into(e.name(), &mut Vec::new())
            .map_err(|e| xml_error(&reader, e))?;
        }
        Event::Empty(e) if e.local_name().as_ref() == TRIAL_ELEMENT.as_bytes() => {
          return Err(Error::MissingTrialId(trials.len() + 1));
        }
        // Other children are skipped whole, so this closes the root.
        Event::End(_) => break,
        Event::Eof => {
          return Err(Error::Xml {
            position: reader.buffer_position() as u64,
            message:  format!("unexpected end of document inside <{ROOT_ELEMENT}>"),
          });
        }
        _ => {}
      },

      State::Trial {
        raw,
        depth,
        field,
        text,
      } => match event {
        Event::Start(e) => {
          *depth += 1;
          if *depth == 1 {
            *field = TrialField::from_element_name(e.local_name().as_ref());
            text.clear();
          }
        }
        Event::Text(e) if *depth == 1 && field.is_some() => {
          let unescaped = e.unescape().map_err(|e| xml_error(&reader, e))?;
          text.push_str(&unescaped);
        }
        Event::CData(e) if *depth == 1 && field.is_some() => {
          text.push_str(&String::from_utf8_lossy(&e));
        }
        Event::End(_) if *depth == 0 => {
          // </Trial>
          let raw = std::mem::take(raw);
          if raw.trial_id.is_empty() {
            return Err(Error::MissingTrialId(trials.len() + 1));
          }
          trials.push(raw);
          next = Some(State::Root);
        }
        Event::End(_) => {
          if *depth == 1
            && let Some(f) = field.take()
          {
            raw.set(f, text);
          }
          *depth -= 1;
        }
        Event::Eof => {
          return Err(Error::Xml {
            position: reader.buffer_position() as u64,
            message:  "unexpected end of document inside <Trial>".into(),
          });
        }
        _ => {}
      },
    }

    if let Some(s) = next {
      state = s;
    }
    buf.clear();
  }

  Ok(trials)
}

fn check_root(name: &[u8]) -> Result<()> {
  if name == ROOT_ELEMENT.as_bytes() {
    Ok(())
  } else {
    Err(Error::UnexpectedRoot(String::from_utf8_lossy(name).into_owned()))
  }
}

fn xml_error<R>(reader: &Reader<R>, e: impl std::fmt::Display) -> Error {
  Error::Xml {
    position: reader.buffer_position() as u64,
    message:  e.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Trials_downloaded_from_ICTRP>
  <Trial>
    <Internal_Number>1</Internal_Number>
    <TrialID>NCT04280705</TrialID>
    <Last_Refreshed_on>9 March 2020</Last_Refreshed_on>
    <Public_title>Adaptive COVID-19 Treatment Trial</Public_title>
    <Primary_sponsor>National Institute of Allergy &amp; Infectious Diseases</Primary_sponsor>
    <Date_registration>21/02/2020</Date_registration>
    <Date_enrollement>February 21, 2020</Date_enrollement>
    <Source_Register>ClinicalTrials.gov</Source_Register>
    <web_address>https://clinicaltrials.gov/show/NCT04280705</web_address>
    <Recruitment_Status>Recruiting</Recruitment_Status>
    <Countries>United States;Korea, Republic of;United States</Countries>
    <Intervention>Drug: Remdesivir;Other: Placebo</Intervention>
    <Study_type>Interventional</Study_type>
    <Phase>Phase 3</Phase>
    <results_url_link></results_url_link>
  </Trial>
  <Trial>
    <TrialID>ChiCTR2000029308</TrialID>
    <Public_title><![CDATA[A randomized <open> trial]]></Public_title>
    <Date_registration>2020-01-23</Date_registration>
    <Countries/>
  </Trial>
</Trials_downloaded_from_ICTRP>"#;

  #[test]
  fn parses_kept_fields() {
    let trials = parse_export(SAMPLE.as_bytes()).unwrap();
    assert_eq!(trials.len(), 2);

    let nct = &trials[0];
    assert_eq!(nct.trial_id, "NCT04280705");
    assert_eq!(
      nct.primary_sponsor.as_deref(),
      Some("National Institute of Allergy & Infectious Diseases")
    );
    assert_eq!(nct.date_registration.as_deref(), Some("21/02/2020"));
    assert_eq!(nct.phase.as_deref(), Some("Phase 3"));
    assert_eq!(nct.results_url_link, None);
    assert_eq!(nct.last_refreshed_on.as_deref(), Some("9 March 2020"));
  }

  #[test]
  fn cdata_and_empty_elements() {
    let trials = parse_export(SAMPLE.as_bytes()).unwrap();
    let chi = &trials[1];
    assert_eq!(chi.public_title.as_deref(), Some("A randomized <open> trial"));
    assert_eq!(chi.countries, None);
    assert_eq!(chi.intervention, None);
  }

  #[test]
  fn wrong_root_is_rejected() {
    let xml = b"<rss><channel/></rss>";
    assert!(matches!(
      parse_export(&xml[..]),
      Err(Error::UnexpectedRoot(name)) if name == "rss"
    ));
  }

  #[test]
  fn empty_export_has_no_trials() {
    let xml = b"<?xml version=\"1.0\"?><Trials_downloaded_from_ICTRP/>";
    assert!(parse_export(&xml[..]).unwrap().is_empty());
  }

  #[test]
  fn trial_without_id_is_an_error() {
    let xml = br#"<Trials_downloaded_from_ICTRP>
      <Trial><TrialID>NCT1</TrialID></Trial>
      <Trial><Public_title>No id</Public_title></Trial>
    </Trials_downloaded_from_ICTRP>"#;
    assert!(matches!(
      parse_export(&xml[..]),
      Err(Error::MissingTrialId(2))
    ));
  }

  #[test]
  fn truncated_document_is_an_error() {
    let xml = b"<Trials_downloaded_from_ICTRP><Trial><TrialID>NCT1</TrialID>";
    assert!(parse_export(&xml[..]).is_err());
  }

  #[test]
  fn document_cut_between_trials_is_an_error() {
    let xml = b"<Trials_downloaded_from_ICTRP><Trial><TrialID>NCT1</TrialID></Trial>";
    let err = parse_export(&xml[..]).unwrap_err();
    assert!(
      matches!(&err, Error::Xml { message, .. } if message.contains(ROOT_ELEMENT)),
      "{err}"
    );
  }

  #[test]
  fn unknown_root_children_are_skipped() {
    let xml = br#"<Trials_downloaded_from_ICTRP>
      <Header><Generated>2020-03-18</Generated></Header>
      <Trial><TrialID>NCT1</TrialID></Trial>
    </Trials_downloaded_from_ICTRP>"#;
    let trials = parse_export(&xml[..]).unwrap();
    assert_eq!(trials.len(), 1);
  }

  #[test]
  fn empty_document_is_an_error() {
    assert!(matches!(parse_export(&b""[..]), Err(Error::EmptyDocument)));
  }
}
