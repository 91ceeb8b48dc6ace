//! Shared fixtures: report pages and a scripted transport.

#![allow(dead_code, unreachable_pub)]

use async_trait::async_trait;
use fintab_data::{StatementKey, Transport, TransportError, Vocabulary};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, sleep};

/// One statement section with the given periods and `(label, cells)` rows.
pub fn section(key: StatementKey, periods: &[&str], rows: &[(&str, &[&str])]) -> String {
    let mut html = format!(
        r#"<div id="{}"><table id="fs-table"><tr><th>In Millions of USD</th>"#,
        key.anchor_id()
    );
    for period in periods {
        html.push_str(&format!("<th>{period}</th>"));
    }
    html.push_str("</tr>");
    for (label, cells) in rows {
        html.push_str(&format!("<tr><td>{label}</td>"));
        for cell in *cells {
            html.push_str(&format!("<td>{cell}</td>"));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table></div>");
    html
}

/// A complete report page: the same table in all six sections.
pub fn report_page(periods: &[&str], rows: &[(&str, &[&str])]) -> String {
    let body: String = StatementKey::ALL
        .iter()
        .map(|key| section(*key, periods, rows))
        .collect();
    format!("<html><body>{body}</body></html>")
}

/// A small page every test vocabulary understands.
pub fn simple_page() -> String {
    report_page(
        &["2021", "2020"],
        &[("Revenue", &["1,000", "900"]), ("Net Income", &["100", "-"])],
    )
}

pub fn vocabulary() -> Vocabulary {
    Vocabulary::from_pairs([("Revenue", "REV"), ("Net Income", "NI")])
}

/// What the transport does for one request.
#[derive(Debug, Clone)]
pub enum Step {
    /// Respond with this body
    Page(String),
    /// Fail with a 503
    Unavailable,
}

/// Responds per symbol from a script; the last step repeats once the script
/// is used up. Symbols without a script get [`simple_page`].
#[derive(Debug, Default)]
pub struct FakeTransport {
    scripts: Mutex<HashMap<String, Vec<Step>>>,
    latency: Duration,
    calls: Mutex<Vec<(String, Instant)>>,
    in_flight: Mutex<(usize, usize)>,
    cancel_on: Option<(String, watch::Sender<bool>)>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, symbol: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(symbol.to_string(), steps);
        self
    }

    pub fn always_failing(self, symbol: &str) -> Self {
        self.script(symbol, vec![Step::Unavailable])
    }

    pub fn failing_times(self, symbol: &str, failures: usize) -> Self {
        let mut steps = vec![Step::Unavailable; failures];
        steps.push(Step::Page(simple_page()));
        self.script(symbol, steps)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Send the cancellation signal when `symbol` is requested.
    pub fn cancel_on(mut self, symbol: &str, signal: watch::Sender<bool>) -> Self {
        self.cancel_on = Some((symbol.to_string(), signal));
        self
    }

    /// Requested URLs with their start times.
    pub fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, symbol: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(url, _)| symbol_of(url) == symbol)
            .count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.in_flight.lock().unwrap().1
    }

    fn next_step(&self, symbol: &str) -> Step {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(symbol) {
            Some(steps) if steps.len() > 1 => steps.remove(0),
            Some(steps) => steps[0].clone(),
            None => Step::Page(simple_page()),
        }
    }
}

fn symbol_of(url: &str) -> &str {
    let target = url.rsplit('=').next().unwrap_or(url);
    target.rsplit(':').next().unwrap_or(target)
}

#[async_trait]
impl Transport for FakeTransport {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let symbol = symbol_of(url).to_string();
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), Instant::now()));
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            in_flight.0 += 1;
            in_flight.1 = in_flight.1.max(in_flight.0);
        }
        if let Some((trigger, signal)) = &self.cancel_on {
            if *trigger == symbol {
                signal.send_replace(true);
            }
        }

        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
        let step = self.next_step(&symbol);
        self.in_flight.lock().unwrap().0 -= 1;

        match step {
            Step::Page(body) => Ok(body.into_bytes()),
            Step::Unavailable => Err(TransportError::Status {
                url: url.to_string(),
                status: 503,
            }),
        }
    }
}
