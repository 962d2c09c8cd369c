//! Integration tests: the generative assist flow through the controller.
//!
//! Uses `ScriptedAssist` in place of a real service, so every reply and
//! failure is deterministic.

use pbl_core::{Catalog, ContextScope, NodeId, NodeKind, PortRef};
use pbl_editor::{
    AssistError, CanvasController, CardEdit, FALLBACK_TEXT, GenerateAction, GenerationError, ScriptedAssist,
    parse_proposals,
};
use pretty_assertions::assert_eq;

fn add(ctl: &mut CanvasController, kind: NodeKind) -> NodeId {
    let catalog = Catalog::builtin();
    ctl.add_node(catalog.find(kind).unwrap()).unwrap()
}

#[test]
fn generating_twice_keeps_history() {
    let mut ctl = CanvasController::default();
    let dq = add(&mut ctl, NodeKind::DrivingQuestion);
    let assist = ScriptedAssist::new()
        .reply("How might we keep our river clean?")
        .reply("How might we share clean water with the town?");

    ctl.generate(dq, &assist).unwrap();
    ctl.generate(dq, &assist).unwrap();

    let node = ctl.node(dq).unwrap();
    assert_eq!(node.results.len(), 2);
    assert_eq!(node.active_result, Some(1));
    assert_eq!(node.results[0], "How might we keep our river clean?");
    assert_eq!(node.result, "How might we share clean water with the town?");
    assert_eq!(
        node.field("f5").unwrap().value,
        "How might we share clean water with the town?"
    );
}

#[test]
fn requests_for_different_cards_finish_in_any_order() {
    let mut ctl = CanvasController::default();
    let ctx = add(&mut ctl, NodeKind::ContextIntro);
    let edp = add(&mut ctl, NodeKind::DesignProcess);

    let first = ctl.begin_generation(ctx).unwrap();
    let second = ctl.begin_generation(edp).unwrap();
    assert!(ctl.is_busy(ctx) && ctl.is_busy(edp));
    assert_eq!(ctl.card_view(ctx).unwrap().generate, Some(GenerateAction::Busy));

    ctl.finish_generation(second, Ok("Five stages".into())).unwrap();
    assert!(ctl.is_busy(ctx));
    assert!(!ctl.is_busy(edp));
    ctl.finish_generation(first, Ok("A letter from the mayor".into()))
        .unwrap();

    assert_eq!(ctl.node(ctx).unwrap().results, vec!["A letter from the mayor"]);
    assert_eq!(ctl.node(edp).unwrap().results, vec!["Five stages"]);
    assert_eq!(ctl.node(edp).unwrap().field("f5").unwrap().value, "Five stages");
}

#[test]
fn empty_reply_becomes_fallback() {
    let mut ctl = CanvasController::default();
    let rubric = add(&mut ctl, NodeKind::Rubric);
    let assist = ScriptedAssist::new().reply("   ");
    ctl.generate(rubric, &assist).unwrap();

    let node = ctl.node(rubric).unwrap();
    assert_eq!(node.results, vec![FALLBACK_TEXT]);
    assert_eq!(node.field("r1").unwrap().value, FALLBACK_TEXT);
    assert!(!ctl.is_busy(rubric));
    assert_eq!(ctl.take_notices().len(), 1);
}

#[test]
fn card_removed_mid_flight() {
    let mut ctl = CanvasController::default();
    let ctx = add(&mut ctl, NodeKind::ContextIntro);
    let request = ctl.begin_generation(ctx).unwrap();
    ctl.remove_node(ctx);

    let err = ctl
        .finish_generation(request, Err(AssistError::EmptyResponse))
        .unwrap_err();
    assert_eq!(err, GenerationError::UnknownNode(ctx));
    assert!(!ctl.is_busy(ctx));
}

#[test]
fn upstream_pinned_results_reach_the_prompt() {
    let mut ctl = CanvasController::default();
    let dq = add(&mut ctl, NodeKind::DrivingQuestion);
    let edp = add(&mut ctl, NodeKind::DesignProcess);
    let stray = add(&mut ctl, NodeKind::ContextIntro);
    ctl.link(PortRef::output(dq, 2), PortRef::input(edp, 0)).unwrap();

    let assist = ScriptedAssist::new()
        .reply("HMW v1")
        .reply("HMW v2")
        .reply("Unrelated story")
        .reply("plan")
        .reply("plan again");
    ctl.generate(dq, &assist).unwrap();
    ctl.generate(dq, &assist).unwrap();
    ctl.generate(stray, &assist).unwrap();
    ctl.edit_card(dq, &CardEdit::PinResult { index: 1 }).unwrap();

    ctl.generate(edp, &assist).unwrap();
    let prompt = assist.prompts().pop().unwrap();
    assert!(prompt.contains("Project background: HMW v2."));
    assert!(prompt.contains("[Driving question generator] HMW v2"));
    assert!(!prompt.contains("Unrelated story"));

    ctl.set_context_scope(ContextScope::AllWithResults);
    ctl.generate(edp, &assist).unwrap();
    let prompt = assist.prompts().pop().unwrap();
    assert!(prompt.contains("[Context intro] Unrelated story"));
}

#[test]
fn proposals_become_cards() {
    let mut ctl = CanvasController::default();
    let raw = r#"[
        {"title": "Peer feedback", "type": "scaffold-material",
         "fields": [{"id": "m1", "label": "Material", "value": "Sticky notes", "type": "text"}]},
        {}
    ]"#;
    let proposals = parse_proposals(raw).unwrap();
    let ids: Vec<_> = proposals
        .iter()
        .map(|p| ctl.add_proposed(p).unwrap())
        .collect();

    let first = ctl.node(ids[0]).unwrap();
    assert_eq!(first.kind, NodeKind::MaterialCard);
    assert_eq!(first.field("m1").unwrap().value, "Sticky notes");
    let second = ctl.node(ids[1]).unwrap();
    assert_eq!(second.kind, NodeKind::Generic);
    assert_eq!(second.title, "Suggested node");
}
