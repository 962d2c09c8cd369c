pub mod assist;
pub mod card;
pub mod controller;
pub mod input;
pub mod interaction;

pub use assist::{
    AssistError, FALLBACK_TEXT, GenerationError, GenerativeAssist, Intervention, build_prompt,
    parse_proposals, request_intervention,
};
#[cfg(any(test, feature = "testing"))]
pub use assist::ScriptedAssist;
pub use card::{CardEdit, CardView, EditError, EditorLayout, GenerateAction, Widget};
pub use controller::{CanvasController, GenerationRequest, Notice};
pub use input::InputEvent;
pub use interaction::{CanvasMutation, Gesture, GestureMachine};
