//! Weekly trend chart, written as SVG.
//!
//! Two series over the same x positions (one per week-ending date): new
//! registrations that week and the running total. Points are labelled with
//! their values; the first weekly point is left unlabelled because it sits on
//! the cumulative one.

use std::io::Cursor;

use ictrp_core::snapshot::WeeklyCount;
use quick_xml::{
  Writer,
  events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use crate::error::{Error, Result};

const NS_SVG: &str = "http://www.w3.org/2000/svg";

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 500.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 50.0;
const MARGIN_BOTTOM: f64 = 110.0;
/// Headroom below zero so the zero-valued markers are not cut off.
const Y_FLOOR: f64 = -20.0;

const NEW_COLOUR: &str = "#1f77b4";
const CUMULATIVE_COLOUR: &str = "#ff7f0e";

/// Labels drawn on the chart.
#[derive(Debug, Clone)]
pub struct ChartOptions {
  pub title:       String,
  pub x_label:     String,
  pub y_label:     String,
  pub new_label:   String,
  pub total_label: String,
}

impl Default for ChartOptions {
  fn default() -> Self {
    Self {
      title:       "Registered COVID-19 Trials by Week on the ICTRP".into(),
      x_label:     "Week Ending Date".into(),
      y_label:     "Registered Trials".into(),
      new_label:   "New Trials".into(),
      total_label: "Cumulative Trials".into(),
    }
  }
}

/// Render `weeks` as a standalone SVG document.
pub fn render_trend_chart(
  weeks: &[WeeklyCount],
  opts: &ChartOptions,
) -> Result<Vec<u8>> {
  let max = weeks
    .iter()
    .map(|w| w.cumulative_trials.max(w.new_trials))
    .max()
    .unwrap_or(0);
  let plot = Plot::new(weeks.len(), y_ceiling(max));

  let mut c = Canvas::new()?;
  c.start("svg", &[
    ("xmlns", NS_SVG.to_string()),
    ("width", px(WIDTH)),
    ("height", px(HEIGHT)),
    ("viewBox", format!("0 0 {WIDTH} {HEIGHT}")),
    ("font-family", "sans-serif".into()),
  ])?;
  c.empty("rect", &[
    ("width", "100%".into()),
    ("height", "100%".into()),
    ("fill", "white".into()),
  ])?;

  c.text(
    &[
      ("x", px(WIDTH / 2.0)),
      ("y", px(MARGIN_TOP / 2.0)),
      ("text-anchor", "middle".into()),
      ("font-size", "16".into()),
    ],
    &opts.title,
  )?;

  draw_axes(&mut c, &plot, weeks, opts)?;

  let new: Vec<u32> = weeks.iter().map(|w| w.new_trials).collect();
  let total: Vec<u32> = weeks.iter().map(|w| w.cumulative_trials).collect();
  draw_series(&mut c, &plot, &new, NEW_COLOUR, LabelPlacement::Below, 1)?;
  draw_series(
    &mut c,
    &plot,
    &total,
    CUMULATIVE_COLOUR,
    LabelPlacement::Above,
    0,
  )?;

  draw_legend(&mut c, opts)?;

  c.end("svg")?;
  Ok(c.finish())
}

// ─── Geometry ────────────────────────────────────────────────────────────────

struct Plot {
  points: usize,
  y_max:  f64,
}

impl Plot {
  fn new(points: usize, y_max: f64) -> Self { Self { points, y_max } }

  fn left(&self) -> f64 { MARGIN_LEFT }

  fn right(&self) -> f64 { WIDTH - MARGIN_RIGHT }

  fn top(&self) -> f64 { MARGIN_TOP }

  fn bottom(&self) -> f64 { HEIGHT - MARGIN_BOTTOM }

  fn x(&self, i: usize) -> f64 {
    let span = self.right() - self.left();
    if self.points <= 1 {
      return self.left() + span / 2.0;
    }
    // Half a step of padding at each end, like a categorical axis.
    let step = span / self.points as f64;
    self.left() + step * (i as f64 + 0.5)
  }

  fn y(&self, value: f64) -> f64 {
    let frac = (value - Y_FLOOR) / (self.y_max - Y_FLOOR);
    self.bottom() - frac * (self.bottom() - self.top())
  }

  fn y_step(&self) -> f64 { tick_step(self.y_max) }
}

/// Round `max` (plus ten percent headroom) up to a multiple of the tick step.
fn y_ceiling(max: u32) -> f64 {
  let padded = (f64::from(max) * 1.1).max(50.0);
  let step = tick_step(padded);
  (padded / step).ceil() * step
}

/// 1, 2 or 5 times a power of ten, giving roughly five ticks.
fn tick_step(span: f64) -> f64 {
  let raw = span / 5.0;
  let magnitude = 10f64.powf(raw.log10().floor());
  let residual = raw / magnitude;
  let nice = if residual <= 1.0 {
    1.0
  } else if residual <= 2.0 {
    2.0
  } else if residual <= 5.0 {
    5.0
  } else {
    10.0
  };
  nice * magnitude
}

fn px(v: f64) -> String { format!("{v:.1}") }

// ─── Drawing ─────────────────────────────────────────────────────────────────

fn draw_axes(
  c: &mut Canvas,
  plot: &Plot,
  weeks: &[WeeklyCount],
  opts: &ChartOptions,
) -> Result<()> {
  c.empty("rect", &[
    ("x", px(plot.left())),
    ("y", px(plot.top())),
    ("width", px(plot.right() - plot.left())),
    ("height", px(plot.bottom() - plot.top())),
    ("fill", "none".into()),
    ("stroke", "black".into()),
  ])?;

  let step = plot.y_step();
  let mut tick = 0.0;
  while tick <= plot.y_max {
    let y = plot.y(tick);
    c.empty("line", &[
      ("x1", px(plot.left())),
      ("x2", px(plot.right())),
      ("y1", px(y)),
      ("y2", px(y)),
      ("stroke", "#dddddd".into()),
    ])?;
    c.text(
      &[
        ("x", px(plot.left() - 6.0)),
        ("y", px(y + 4.0)),
        ("text-anchor", "end".into()),
        ("font-size", "10".into()),
      ],
      &format!("{tick}"),
    )?;
    tick += step;
  }

  for (i, week) in weeks.iter().enumerate() {
    let x = plot.x(i);
    let y = plot.bottom() + 12.0;
    c.text(
      &[
        ("x", px(x)),
        ("y", px(y)),
        ("text-anchor", "end".into()),
        ("font-size", "8".into()),
        ("transform", format!("rotate(-45 {} {})", px(x), px(y))),
      ],
      &week.week_ending.format("%Y-%m-%d").to_string(),
    )?;
  }

  c.text(
    &[
      ("x", px((plot.left() + plot.right()) / 2.0)),
      ("y", px(HEIGHT - 12.0)),
      ("text-anchor", "middle".into()),
      ("font-size", "12".into()),
    ],
    &opts.x_label,
  )?;
  let (lx, ly) = (18.0, (plot.top() + plot.bottom()) / 2.0);
  c.text(
    &[
      ("x", px(lx)),
      ("y", px(ly)),
      ("text-anchor", "middle".into()),
      ("font-size", "12".into()),
      ("transform", format!("rotate(-90 {} {})", px(lx), px(ly))),
    ],
    &opts.y_label,
  )?;
  Ok(())
}

#[derive(Clone, Copy)]
enum LabelPlacement {
  Above,
  Below,
}

fn draw_series(
  c: &mut Canvas,
  plot: &Plot,
  values: &[u32],
  colour: &str,
  placement: LabelPlacement,
  skip_labels: usize,
) -> Result<()> {
  let points: Vec<(f64, f64)> = values
    .iter()
    .enumerate()
    .map(|(i, v)| (plot.x(i), plot.y(f64::from(*v))))
    .collect();

  let path = points
    .iter()
    .map(|(x, y)| format!("{},{}", px(*x), px(*y)))
    .collect::<Vec<_>>()
    .join(" ");
  c.empty("polyline", &[
    ("points", path),
    ("fill", "none".into()),
    ("stroke", colour.into()),
    ("stroke-width", "1.5".into()),
  ])?;

  for (i, ((x, y), value)) in points.iter().zip(values).enumerate() {
    c.empty("circle", &[
      ("cx", px(*x)),
      ("cy", px(*y)),
      ("r", "3".into()),
      ("fill", colour.into()),
    ])?;
    if i < skip_labels {
      continue;
    }
    let (dx, dy) = match placement {
      LabelPlacement::Above => (-6.0, -8.0),
      LabelPlacement::Below => (-3.0, 14.0),
    };
    c.text(
      &[
        ("x", px(x + dx)),
        ("y", px(y + dy)),
        ("font-size", "9".into()),
      ],
      &value.to_string(),
    )?;
  }
  Ok(())
}

fn draw_legend(c: &mut Canvas, opts: &ChartOptions) -> Result<()> {
  let x = MARGIN_LEFT + 12.0;
  let mut y = MARGIN_TOP + 16.0;
  for (label, colour) in [
    (&opts.new_label, NEW_COLOUR),
    (&opts.total_label, CUMULATIVE_COLOUR),
  ] {
    c.empty("line", &[
      ("x1", px(x)),
      ("x2", px(x + 24.0)),
      ("y1", px(y)),
      ("y2", px(y)),
      ("stroke", colour.into()),
      ("stroke-width", "1.5".into()),
    ])?;
    c.empty("circle", &[
      ("cx", px(x + 12.0)),
      ("cy", px(y)),
      ("r", "3".into()),
      ("fill", colour.into()),
    ])?;
    c.text(
      &[("x", px(x + 30.0)), ("y", px(y + 4.0)), ("font-size", "11".into())],
      label,
    )?;
    y += 18.0;
  }
  Ok(())
}

// ─── XML writer helpers ──────────────────────────────────────────────────────

struct Canvas {
  writer: Writer<Cursor<Vec<u8>>>,
}

impl Canvas {
  fn new() -> Result<Self> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer
      .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
      .map_err(write_error)?;
    Ok(Self { writer })
  }

  fn start(&mut self, tag: &str, attrs: &[(&str, String)]) -> Result<()> {
    self
      .writer
      .write_event(Event::Start(element(tag, attrs)))
      .map_err(write_error)
  }

  fn end(&mut self, tag: &str) -> Result<()> {
    self
      .writer
      .write_event(Event::End(BytesEnd::new(tag)))
      .map_err(write_error)
  }

  fn empty(&mut self, tag: &str, attrs: &[(&str, String)]) -> Result<()> {
    self
      .writer
      .write_event(Event::Empty(element(tag, attrs)))
      .map_err(write_error)
  }

  /// `<text …>content</text>`; `content` is escaped.
  fn text(&mut self, attrs: &[(&str, String)], content: &str) -> Result<()> {
    self.start("text", attrs)?;
    self
      .writer
      .write_event(Event::Text(BytesText::new(content)))
      .map_err(write_error)?;
    self.end("text")
  }

  fn finish(self) -> Vec<u8> { self.writer.into_inner().into_inner() }
}

fn element<'a>(tag: &'a str, attrs: &[(&str, String)]) -> BytesStart<'a> {
  let mut el = BytesStart::new(tag);
  for (k, v) in attrs {
    el.push_attribute((*k, v.as_str()));
  }
  el
}

fn write_error(e: impl std::fmt::Display) -> Error { Error::Write(e.to_string()) }

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn week(day: u32, new: u32, total: u32) -> WeeklyCount {
    WeeklyCount {
      week_ending:       NaiveDate::from_ymd_opt(2020, 3, day).unwrap(),
      new_trials:        new,
      cumulative_trials: total,
    }
  }

  fn render(weeks: &[WeeklyCount]) -> String {
    let bytes = render_trend_chart(weeks, &ChartOptions::default()).unwrap();
    String::from_utf8(bytes).unwrap()
  }

  #[test]
  fn chart_contains_series_and_labels() {
    let svg = render(&[week(1, 40, 40), week(8, 25, 65), week(15, 60, 125)]);

    assert!(svg.starts_with("<?xml"));
    assert_eq!(svg.matches("<polyline").count(), 2);
    // three markers per series plus two legend markers
    assert_eq!(svg.matches("<circle").count(), 8);
    assert!(svg.contains("2020-03-15"));
    assert!(svg.contains(">125</text>"));
    assert!(svg.contains("Week Ending Date"));
    assert!(svg.contains("Registered COVID-19 Trials by Week on the ICTRP"));
  }

  #[test]
  fn first_weekly_point_is_unlabelled() {
    let svg = render(&[week(1, 7, 7), week(8, 3, 10)]);
    // "7" appears once for the cumulative label, never for the weekly one.
    assert_eq!(svg.matches(">7</text>").count(), 1);
    assert_eq!(svg.matches(">3</text>").count(), 1);
  }

  #[test]
  fn title_is_escaped() {
    let opts = ChartOptions {
      title: "Trials <draft> & counts".into(),
      ..ChartOptions::default()
    };
    let bytes = render_trend_chart(&[week(1, 1, 1)], &opts).unwrap();
    let svg = String::from_utf8(bytes).unwrap();
    assert!(svg.contains("Trials &lt;draft&gt; &amp; counts"));
  }

  #[test]
  fn empty_series_still_renders() {
    let svg = render(&[]);
    assert!(svg.contains("</svg>"));
  }

  #[test]
  fn ceiling_leaves_headroom() {
    assert_eq!(y_ceiling(0), 50.0);
    assert!(y_ceiling(540) >= 594.0);
    assert_eq!(tick_step(50.0), 10.0);
  }
}
