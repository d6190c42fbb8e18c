use std::collections::VecDeque;
use std::env;
use std::fs::File;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

use vdom_inspector::{
    DevTool, DevToolView, EvalResponse, InspectedWindow, InspectorConfig, PanelAction, TabId,
    Ticket,
};

const INSPECTED_TAB: TabId = TabId(1);

/// Stand-in for a browser page: answers diagnostics queries from canned snapshots.
struct FixtureWindow {
    root: String,
    queue: VecDeque<EvalResponse>,
}

impl FixtureWindow {
    fn new(root: &str) -> Self {
        Self {
            root: root.to_owned(),
            queue: VecDeque::new(),
        }
    }

    fn answer(api_call: &str) -> Value {
        if api_call == "version" {
            json!("2.0.0")
        } else if api_call == "eventLog" {
            json!([
                { "timestamp": 1_700_000_000_000.0_f64, "level": "info", "type": "projector.attach", "data": { "projector": "main" } },
                { "timestamp": 1_700_000_000_250.0_f64, "level": "info", "type": "render.scheduled", "data": { "projector": "main", "innerRender": 1.234_56, "outerRender": 4.5 } },
                { "timestamp": 1_700_000_001_000.0_f64, "level": "warn", "type": "store.changed", "data": { "store": "todos", "paths": "[\"/items/0/done\"]" } }
            ])
        } else if api_call == "getProjectors()" {
            json!(["main"])
        } else if api_call.starts_with("getProjectorLastRender(") {
            json!({
                "type": "wnode",
                "widgetConstructor": "TodoApp",
                "properties": { "title": "todos" },
                "rendered": [{
                    "type": "hnode",
                    "tag": "section",
                    "properties": { "classes": ["todoapp"] },
                    "children": [
                        { "type": "hnode", "tag": "h1", "children": ["todos"] },
                        {
                            "type": "hnode",
                            "tag": "ul",
                            "children": [
                                { "type": "wnode", "widgetConstructor": "TodoItem", "properties": { "key": "1", "done": false }, "rendered": [{ "type": "hnode", "tag": "li", "children": ["write docs"] }] },
                                { "type": "wnode", "widgetConstructor": "TodoItem", "properties": { "key": "2", "done": true }, "rendered": [{ "type": "hnode", "tag": "li", "children": ["ship it"] }] }
                            ]
                        },
                        null
                    ]
                }]
            })
        } else if api_call == "getStores()" {
            json!(["todos"])
        } else if api_call.starts_with("getStoreState(") {
            json!({
                "items": [
                    { "label": "write docs", "done": false },
                    { "label": "ship it", "done": true }
                ],
                "filter": "@@undefined",
                "owner": null,
                "onChange": "@@function:onChange",
                "id": "@@symbol:todos",
                "serialized": "{\"nested\":[1,2,3]}"
            })
        } else {
            Value::Null
        }
    }

    fn drain(&mut self) -> Vec<EvalResponse> {
        self.queue.drain(..).collect()
    }
}

impl InspectedWindow for FixtureWindow {
    fn eval(&mut self, ticket: Ticket, expression: &str) {
        let api_call = expression
            .strip_prefix(self.root.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(expression);
        // Newest first, to exercise out-of-order delivery.
        self.queue.push_front(EvalResponse::ok(ticket, Self::answer(api_call)));
    }
}

fn init_logging() -> io::Result<()> {
    let Ok(path) = env::var("VDOM_INSPECTOR_LOG") else {
        return Ok(());
    };
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_config() -> InspectorConfig {
    let Some(path) = env::args().nth(1) else {
        return InspectorConfig::default();
    };
    match InspectorConfig::load(&path) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(%err, "falling back to default config");
            InspectorConfig::default()
        }
    }
}

fn pump(tool: &mut DevTool<FixtureWindow>) {
    // Responses may trigger follow-up queries.
    loop {
        let responses = tool.window_mut().drain();
        if responses.is_empty() {
            break;
        }
        for response in responses {
            if let Err(err) = tool.on_response(response) {
                tracing::info!(%err, "diagnostics request failed");
            }
        }
    }
}

/// Messages the page's diagnostics channel would push; the tab 2 one is filtered out.
fn push_messages(tool: &mut DevTool<FixtureWindow>) {
    let messages = [
        json!({ "tabId": 1, "eventId": "projector.attach", "data": { "projector": "main" } }),
        json!({ "tabId": 2, "eventId": "projector.attach", "data": { "projector": "other" } }),
        json!({ "tabId": 1, "eventId": "widget.invalidated", "data": { "widget": "TodoItem", "key": "2" } }),
    ];
    for message in messages {
        if let Err(err) = tool.on_push_value(message) {
            tracing::warn!(%err, "dropping malformed diagnostic message");
        }
    }
}

fn run_app(mut terminal: DefaultTerminal, mut tool: DevTool<FixtureWindow>) -> io::Result<()> {
    let config = tool.panel().config().clone();
    loop {
        terminal.draw(|frame| {
            frame.render_stateful_widget(DevToolView::new(&config), frame.area(), tool.panel_mut());
        })?;

        if event::poll(Duration::from_millis(200))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if tool.handle_key(key) == Some(PanelAction::Quit) {
                        break;
                    }
                    pump(&mut tool);
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn main() -> io::Result<()> {
    init_logging()?;
    let config = load_config();
    let window = FixtureWindow::new(&config.diagnostic_root);
    // Starts on the banner; 'R' or Enter connects.
    let mut tool = DevTool::with_config(window, config).with_inspected_tab(INSPECTED_TAB);
    push_messages(&mut tool);

    let terminal = ratatui::init();
    let result = run_app(terminal, tool);
    ratatui::restore();
    result
}
