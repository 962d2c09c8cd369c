//! WASM bridge for PBL Canvas: exposes the course-design canvas to the
//! browser host shell.
//!
//! Compiled via `wasm-pack build --target web`. The host owns the DOM and
//! the network; everything that changes cards or links goes through
//! [`PblCanvas`]. Structured data crosses the boundary as JSON strings.

use pbl_core::{Catalog, CanvasMetrics, ContextScope, NodeId, NodeKind};
use pbl_editor::assist::intervention_prompt;
use pbl_editor::{
    AssistError, CanvasController, CardEdit, Gesture, GenerationRequest, InputEvent, Intervention, parse_proposals,
};
use pbl_render::{connectors, render_svg, svg_path};
use std::collections::HashMap;
use wasm_bindgen::prelude::*;

/// The main WASM-facing canvas controller.
///
/// Holds the canvas controller and the generation requests the host is
/// still waiting on, keyed by the handle returned from
/// [`PblCanvas::begin_generation`].
#[wasm_bindgen]
pub struct PblCanvas {
    controller: CanvasController,
    catalog: Catalog,
    pending: HashMap<u32, GenerationRequest>,
    next_request: u32,
}

impl Default for PblCanvas {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl PblCanvas {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        host_setup();
        Self {
            controller: CanvasController::with_seed(CanvasMetrics::default(), host_seed()),
            catalog: Catalog::builtin(),
            pending: HashMap::new(),
            next_request: 1,
        }
    }

    // ─── Cards ───────────────────────────────────────────────────────────

    /// Add a catalog card by its wire type name. Returns the new id, or an
    /// empty string if the catalog has no such card.
    pub fn add_node(&mut self, type_name: &str) -> String {
        let kind = NodeKind::from_type_name(type_name);
        let Some(template) = self.catalog.find(kind) else {
            log::warn!("no catalog card for {type_name:?}");
            return String::new();
        };
        match self.controller.add_node(template) {
            Ok(id) => id.as_str().to_string(),
            Err(e) => {
                log::warn!("add failed: {e}");
                String::new()
            }
        }
    }

    /// Add every card in an assistant reply. Returns
    /// `{"ok":true,"ids":[...]}` or `{"ok":false,"error":"..."}`.
    pub fn add_proposals(&mut self, raw: &str) -> String {
        let proposals = match parse_proposals(raw) {
            Ok(p) => p,
            Err(e) => return error_json(&e),
        };
        let mut ids = Vec::with_capacity(proposals.len());
        for proposal in &proposals {
            match self.controller.add_proposed(proposal) {
                Ok(id) => ids.push(id.as_str().to_string()),
                Err(e) => return error_json(&e),
            }
        }
        serde_json::json!({ "ok": true, "ids": ids }).to_string()
    }

    /// Remove a card and its links. Returns `false` for an unknown id.
    pub fn remove_node(&mut self, id: &str) -> bool {
        lookup(id).is_some_and(|id| self.controller.remove_node(id).is_some())
    }

    /// Apply a JSON-encoded card edit, e.g.
    /// `{"edit":"set-value","field":"f1","value":"Grade 4"}`.
    pub fn edit_card(&mut self, id: &str, edit: &str) -> String {
        let edit: CardEdit = match serde_json::from_str(edit) {
            Ok(edit) => edit,
            Err(e) => return error_json(&e),
        };
        let Some(id) = lookup(id) else {
            return unknown_card(id);
        };
        match self.controller.edit_card(id, &edit) {
            Ok(()) => ok_json(),
            Err(e) => error_json(&e),
        }
    }

    /// Shorthand for the most common edit.
    pub fn set_field_value(&mut self, id: &str, field: &str, value: &str) -> bool {
        let edit = CardEdit::SetValue {
            field: field.to_string(),
            value: value.to_string(),
        };
        lookup(id).is_some_and(|id| self.controller.edit_card(id, &edit).is_ok())
    }

    /// Register the host's extended-editor hook, called with a card id.
    pub fn on_select_node_for_detail(&mut self, callback: js_sys::Function) {
        self.controller.on_select_node_for_detail(move |id| {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(id.as_str())) {
                log::warn!("detail callback threw: {e:?}");
            }
        });
    }

    pub fn select_for_detail(&mut self, id: &str) -> bool {
        lookup(id).is_some_and(|id| self.controller.select_for_detail(id))
    }

    /// `"upstream"` or `"all-with-results"`. Anything else is ignored.
    pub fn set_context_scope(&mut self, scope: &str) -> bool {
        match serde_json::from_value::<ContextScope>(serde_json::Value::String(scope.to_string())) {
            Ok(scope) => {
                self.controller.set_context_scope(scope);
                true
            }
            Err(_) => false,
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    pub fn handle_pointer_down(&mut self, x: f32, y: f32) {
        self.controller.handle(&InputEvent::from_pointer_down(x, y));
    }

    pub fn handle_pointer_move(&mut self, x: f32, y: f32) {
        self.controller.handle(&InputEvent::from_pointer_move(x, y));
    }

    pub fn handle_pointer_up(&mut self, x: f32, y: f32) {
        self.controller.handle(&InputEvent::from_pointer_up(x, y));
    }

    pub fn handle_click(&mut self, x: f32, y: f32) {
        self.controller.handle(&InputEvent::from_click(x, y));
    }

    pub fn handle_key(&mut self, key: &str) {
        self.controller.handle(&InputEvent::from_key(key));
    }

    /// The port awaiting its partner as JSON, or `null` when not linking.
    pub fn linking_port(&self) -> String {
        match self.controller.gesture() {
            Gesture::Linking { from } => serde_json::to_string(&from).unwrap_or_else(|_| "null".into()),
            _ => "null".into(),
        }
    }

    // ─── Generation ──────────────────────────────────────────────────────

    /// Mark a card busy and hand its prompt to the host. Returns
    /// `{"ok":true,"request":n,"prompt":"..."}` or an error object.
    pub fn begin_generation(&mut self, id: &str) -> String {
        let Some(id) = lookup(id) else {
            return unknown_card(id);
        };
        match self.controller.begin_generation(id) {
            Ok(request) => {
                let handle = self.next_request;
                self.next_request = self.next_request.wrapping_add(1);
                let body = serde_json::json!({
                    "ok": true,
                    "request": handle,
                    "prompt": &request.prompt,
                });
                self.pending.insert(handle, request);
                body.to_string()
            }
            Err(e) => error_json(&e),
        }
    }

    /// Record the assistant's reply for a pending request.
    pub fn finish_generation(&mut self, request: u32, text: &str) -> String {
        self.settle(request, Ok(text.to_string()))
    }

    /// Record a failed request. The card gets the fallback text.
    pub fn fail_generation(&mut self, request: u32, reason: &str) -> String {
        self.settle(request, Err(AssistError::Transport(reason.to_string())))
    }

    /// Forget a request without touching the card. Clears its busy mark.
    pub fn cancel_generation(&mut self, request: u32) -> bool {
        self.pending.remove(&request).is_some()
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    pub fn nodes_json(&self) -> String {
        let nodes: Vec<_> = self.controller.nodes().collect();
        serde_json::to_string(&nodes).unwrap_or_else(|_| "[]".into())
    }

    pub fn connections_json(&self) -> String {
        let conns: Vec<_> = self.controller.connections().collect();
        serde_json::to_string(&conns).unwrap_or_else(|_| "[]".into())
    }

    /// What the card editor should draw for `id`, or `null`.
    pub fn card_view_json(&self, id: &str) -> String {
        lookup(id)
            .and_then(|id| self.controller.card_view(id))
            .and_then(|view| serde_json::to_string(&view).ok())
            .unwrap_or_else(|| "null".into())
    }

    /// Drain pending notices as a JSON array of messages.
    pub fn take_notices(&mut self) -> String {
        let messages: Vec<String> = self
            .controller
            .take_notices()
            .iter()
            .map(ToString::to_string)
            .collect();
        serde_json::to_string(&messages).unwrap_or_else(|_| "[]".into())
    }

    /// SVG path data for every connector, as `[{"id":..,"d":..}]`.
    pub fn connector_paths(&self) -> String {
        let paths: Vec<_> = connectors(self.controller.graph(), self.controller.metrics())
            .iter()
            .map(|(id, curve)| serde_json::json!({ "id": id.as_str(), "d": svg_path(curve) }))
            .collect();
        serde_json::Value::Array(paths).to_string()
    }

    /// Export the canvas as a standalone SVG document.
    pub fn export_svg(&self) -> String {
        render_svg(self.controller.graph(), self.controller.metrics())
    }
}

// ─── Private helpers ─────────────────────────────────────────────────────

impl PblCanvas {
    fn settle(&mut self, request: u32, outcome: Result<String, AssistError>) -> String {
        let Some(request) = self.pending.remove(&request) else {
            return serde_json::json!({ "ok": false, "error": "unknown request" }).to_string();
        };
        match self.controller.finish_generation(request, outcome) {
            Ok(()) => ok_json(),
            Err(e) => error_json(&e),
        }
    }
}

/// Resolve a host-supplied id. Strings the canvas never issued stay out of the interner.
fn lookup(id: &str) -> Option<NodeId> {
    NodeId::get(id)
}

fn unknown_card(id: &str) -> String {
    error_json(&format!("no card with id '{id}'"))
}

fn ok_json() -> String {
    r#"{"ok":true}"#.to_string()
}

fn error_json(e: &dyn std::fmt::Display) -> String {
    serde_json::json!({ "ok": false, "error": e.to_string() }).to_string()
}

// ─── Host setup ──────────────────────────────────────────────────────────

/// Install the panic hook and the console logger once per page.
fn host_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("PBL WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
            if log::set_logger(&console::LOGGER).is_ok() {
                log::set_max_level(log::LevelFilter::Debug);
            }
        });
    }
}

#[cfg(target_arch = "wasm32")]
mod console {
    pub(crate) static LOGGER: ConsoleLogger = ConsoleLogger;

    pub(crate) struct ConsoleLogger;

    impl log::Log for ConsoleLogger {
        fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &log::Record<'_>) {
            if !self.enabled(record.metadata()) {
                return;
            }
            let msg = wasm_bindgen::JsValue::from(format!("[{}] {}", record.target(), record.args()));
            match record.level() {
                log::Level::Error => web_sys::console::error_1(&msg),
                log::Level::Warn => web_sys::console::warn_1(&msg),
                _ => web_sys::console::log_1(&msg),
            }
        }

        fn flush(&self) {}
    }
}

/// Jitter seed. Browsers supply fresh randomness; native builds stay
/// deterministic.
fn host_seed() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        (js_sys::Math::random() * u64::MAX as f64) as u64
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        0x5eed_ca4d
    }
}

// ─── Standalone functions (no canvas needed) ─────────────────────────────

/// The built-in catalog as JSON sections for the sidebar.
#[wasm_bindgen]
pub fn catalog_json() -> String {
    let sections: Vec<_> = Catalog::builtin()
        .sections
        .iter()
        .map(|section| {
            let items: Vec<_> = section
                .items
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": t.kind,
                        "title": t.title,
                        "category": t.category,
                        "interactionType": t.interaction,
                        "hasInputs": t.has_inputs,
                        "hasOutputs": t.has_outputs,
                    })
                })
                .collect();
            serde_json::json!({
                "category": section.category,
                "title": section.title,
                "items": items,
            })
        })
        .collect();
    serde_json::Value::Array(sections).to_string()
}

/// Prompt for a teaching intervention on `query`.
#[wasm_bindgen]
pub fn intervention_request(query: &str) -> String {
    intervention_prompt(query)
}

/// Decode an intervention reply. Unusable replies yield the fallback.
#[wasm_bindgen]
pub fn parse_intervention(raw: &str) -> String {
    let intervention = Intervention::from_reply(Ok(raw.to_string()));
    serde_json::to_string(&intervention).unwrap_or_else(|_| "{}".into())
}
