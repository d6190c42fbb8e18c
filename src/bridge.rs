//! Request/response bridge to the diagnostics API exposed by the inspected page.
//!
//! Queries are rendered as expressions evaluated in the page. Each request gets
//! a [`Ticket`]; responses may arrive in any order and are matched back by
//! ticket. Only the newest request of each [`QueryKind`] is honoured, so a slow
//! answer can never overwrite a fresher one.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{InspectorError, Result};

/// Global the page exposes its diagnostics API under.
pub const DEFAULT_DIAGNOSTIC_ROOT: &str = "__dojo2_diagnostics__";

/// A call into the page's diagnostics API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticQuery {
    EventLog,
    LastRender(String),
    Projectors,
    Stores,
    StoreState(String),
    Version,
    Highlight { projector: String, path: String },
    Unhighlight,
}

/// Fencing class of a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueryKind {
    EventLog,
    LastRender,
    Projectors,
    Stores,
    StoreState,
    Version,
    Highlight,
    Unhighlight,
}

impl QueryKind {
    /// Highlighting has no response payload worth applying.
    pub const fn is_fire_and_forget(self) -> bool {
        matches!(self, Self::Highlight | Self::Unhighlight)
    }
}

impl DiagnosticQuery {
    pub const fn kind(&self) -> QueryKind {
        match self {
            Self::EventLog => QueryKind::EventLog,
            Self::LastRender(_) => QueryKind::LastRender,
            Self::Projectors => QueryKind::Projectors,
            Self::Stores => QueryKind::Stores,
            Self::StoreState(_) => QueryKind::StoreState,
            Self::Version => QueryKind::Version,
            Self::Highlight { .. } => QueryKind::Highlight,
            Self::Unhighlight => QueryKind::Unhighlight,
        }
    }

    /// The API member access or call, without the root namespace.
    pub fn api_call(&self) -> String {
        match self {
            Self::EventLog => "eventLog".to_owned(),
            Self::LastRender(projector) => {
                format!("getProjectorLastRender({})", quote(projector))
            }
            Self::Projectors => "getProjectors()".to_owned(),
            Self::Stores => "getStores()".to_owned(),
            Self::StoreState(store) => format!("getStoreState({})", quote(store)),
            Self::Version => "version".to_owned(),
            Self::Highlight { projector, path } => {
                format!("highlight({}, {})", quote(projector), quote(path))
            }
            Self::Unhighlight => "unhighlight()".to_owned(),
        }
    }

    /// Full expression evaluated in the page: `"{root}.{api}"`.
    pub fn expression(&self, root: &str) -> String {
        format!("{root}.{}", self.api_call())
    }
}

/// Single-quotes a string argument, escaping `\` and `'`.
fn quote(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len() + 2);
    out.push('\'');
    for ch in arg.chars() {
        if matches!(ch, '\\' | '\'') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

/// Identifier of an issued request; tickets only grow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Exception details reported by the page when an evaluation throws.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExceptionInfo {
    pub is_error: bool,
    pub is_exception: bool,
    pub code: Option<String>,
    pub description: Option<String>,
    pub value: Option<Value>,
}

impl fmt::Display for ExceptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.description, &self.value, &self.code) {
            (Some(description), _, _) => f.write_str(description),
            (None, Some(value), _) => write!(f, "{value}"),
            (None, None, Some(code)) => write!(f, "code {code}"),
            (None, None, None) => f.write_str("unknown exception"),
        }
    }
}

/// Evaluates expressions in the inspected page.
///
/// Implementations deliver the outcome later as an [`EvalResponse`] carrying
/// the same ticket; nothing is returned synchronously.
pub trait InspectedWindow {
    fn eval(&mut self, ticket: Ticket, expression: &str);
}

/// Outcome of one evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct EvalResponse {
    pub ticket: Ticket,
    pub result: std::result::Result<Value, ExceptionInfo>,
}

impl EvalResponse {
    pub const fn ok(ticket: Ticket, value: Value) -> Self {
        Self {
            ticket,
            result: Ok(value),
        }
    }

    pub const fn exception(ticket: Ticket, info: ExceptionInfo) -> Self {
        Self {
            ticket,
            result: Err(info),
        }
    }

    /// Builds a response from a callback-style `(result, exception)` pair; any exception wins.
    pub fn from_parts(ticket: Ticket, result: Value, exception: Option<ExceptionInfo>) -> Self {
        match exception {
            Some(info) => Self::exception(ticket, info),
            None => Self::ok(ticket, result),
        }
    }
}

/// A response that passed fencing, paired with the query that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Settled {
    pub query: DiagnosticQuery,
    pub value: Value,
}

/// Issues queries through an [`InspectedWindow`] and fences their responses.
pub struct Bridge<W> {
    window: W,
    root: String,
    next: u64,
    pending: FxHashMap<Ticket, DiagnosticQuery>,
    latest: FxHashMap<QueryKind, Ticket>,
}

impl<W: InspectedWindow> Bridge<W> {
    pub fn new(window: W) -> Self {
        Self::with_root(window, DEFAULT_DIAGNOSTIC_ROOT)
    }

    pub fn with_root(window: W, root: impl Into<String>) -> Self {
        Self {
            window,
            root: root.into(),
            next: 0,
            pending: FxHashMap::default(),
            latest: FxHashMap::default(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub const fn window(&self) -> &W {
        &self.window
    }

    pub const fn window_mut(&mut self) -> &mut W {
        &mut self.window
    }

    /// Number of requests still awaiting a response.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Evaluates `query` in the page; supersedes any outstanding request of the same kind.
    pub fn send(&mut self, query: DiagnosticQuery) -> Ticket {
        self.next += 1;
        let ticket = Ticket(self.next);
        let expression = query.expression(&self.root);
        tracing::trace!(%ticket, %expression, "evaluating in inspected page");
        self.latest.insert(query.kind(), ticket);
        self.pending.insert(ticket, query);
        self.window.eval(ticket, &expression);
        ticket
    }

    /// Matches a response to its request.
    ///
    /// Returns `Ok(None)` for superseded and fire-and-forget responses, and
    /// [`InspectorError::Exception`] when the page rejected a current request.
    pub fn settle(&mut self, response: EvalResponse) -> Result<Option<Settled>> {
        let EvalResponse { ticket, result } = response;
        let Some(query) = self.pending.remove(&ticket) else {
            return Err(InspectorError::UnknownTicket(ticket.get()));
        };
        let kind = query.kind();
        if self.latest.get(&kind) != Some(&ticket) {
            tracing::debug!(%ticket, ?kind, "dropping superseded response");
            return Ok(None);
        }
        self.latest.remove(&kind);

        match result {
            Ok(_) if kind.is_fire_and_forget() => Ok(None),
            Ok(value) => Ok(Some(Settled { query, value })),
            Err(info) if kind.is_fire_and_forget() => {
                tracing::warn!(%ticket, ?kind, exception = %info, "highlight request failed");
                Ok(None)
            }
            Err(info) => {
                tracing::warn!(%ticket, ?kind, exception = %info, "diagnostics request rejected");
                Err(InspectorError::Exception(info))
            }
        }
    }
}

/// Window that only records what it was asked to evaluate.
#[derive(Clone, Debug, Default)]
pub struct RecordingWindow {
    calls: Vec<(Ticket, String)>,
}

impl RecordingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[(Ticket, String)] {
        &self.calls
    }

    /// Removes and returns the recorded calls.
    pub fn drain(&mut self) -> Vec<(Ticket, String)> {
        std::mem::take(&mut self.calls)
    }

    /// Ticket of the most recent call whose expression contains `needle`.
    pub fn last_ticket_for(&self, needle: &str) -> Option<Ticket> {
        self.calls
            .iter()
            .rev()
            .find(|(_, expression)| expression.contains(needle))
            .map(|(ticket, _)| *ticket)
    }
}

impl InspectedWindow for RecordingWindow {
    fn eval(&mut self, ticket: Ticket, expression: &str) {
        self.calls.push((ticket, expression.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expressions_use_root_namespace() {
        let query = DiagnosticQuery::LastRender("main".into());

        assert_eq!(
            query.expression(DEFAULT_DIAGNOSTIC_ROOT),
            "__dojo2_diagnostics__.getProjectorLastRender('main')"
        );
        assert_eq!(DiagnosticQuery::Version.expression("x"), "x.version");
    }

    #[test]
    fn string_arguments_are_escaped() {
        let query = DiagnosticQuery::Highlight {
            projector: "it's".into(),
            path: r"/0\1".into(),
        };

        assert_eq!(query.api_call(), r"highlight('it\'s', '/0\\1')");
    }

    #[test]
    fn newer_request_fences_older_response() {
        let mut bridge = Bridge::new(RecordingWindow::new());
        let first = bridge.send(DiagnosticQuery::EventLog);
        let second = bridge.send(DiagnosticQuery::EventLog);

        let stale = bridge.settle(EvalResponse::ok(first, json!([])));
        let fresh = bridge.settle(EvalResponse::ok(second, json!([1])));

        assert!(matches!(stale, Ok(None)));
        assert_eq!(
            fresh.ok().flatten().map(|settled| settled.value),
            Some(json!([1]))
        );
        assert_eq!(bridge.pending_len(), 0);
    }

    #[test]
    fn different_kinds_do_not_fence_each_other() {
        let mut bridge = Bridge::new(RecordingWindow::new());
        let log = bridge.send(DiagnosticQuery::EventLog);
        let projectors = bridge.send(DiagnosticQuery::Projectors);

        assert!(matches!(bridge.settle(EvalResponse::ok(log, json!([]))), Ok(Some(_))));
        assert!(matches!(
            bridge.settle(EvalResponse::ok(projectors, json!(["main"]))),
            Ok(Some(_))
        ));
    }

    #[test]
    fn exceptions_reject_current_requests() {
        let mut bridge = Bridge::new(RecordingWindow::new());
        let ticket = bridge.send(DiagnosticQuery::Version);
        let info = ExceptionInfo {
            is_exception: true,
            description: Some("ReferenceError".into()),
            ..ExceptionInfo::default()
        };

        let result = bridge.settle(EvalResponse::exception(ticket, info));

        assert!(matches!(result, Err(InspectorError::Exception(_))));
    }

    #[test]
    fn highlight_failures_are_swallowed() {
        let mut bridge = Bridge::new(RecordingWindow::new());
        let ticket = bridge.send(DiagnosticQuery::Unhighlight);

        let result = bridge.settle(EvalResponse::exception(ticket, ExceptionInfo::default()));

        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn unknown_tickets_are_errors() {
        let mut bridge = Bridge::new(RecordingWindow::new());

        let result = bridge.settle(EvalResponse::ok(Ticket::new(42), Value::Null));

        assert!(matches!(result, Err(InspectorError::UnknownTicket(42))));
    }

    #[test]
    fn exception_info_deserializes_from_camel_case() {
        let info: ExceptionInfo =
            serde_json::from_value(json!({ "isException": true, "value": "boom" })).unwrap();

        assert!(info.is_exception);
        assert_eq!(info.to_string(), "\"boom\"");
    }
}
