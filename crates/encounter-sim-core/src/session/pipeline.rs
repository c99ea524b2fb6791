//! Turn-processing pipeline.
//!
//! Sequences triage, action selection, the world-model step, diagnosis
//! inference, safety gating, and guideline retrieval for one chat turn, then
//! composes the structured result.

use crate::error::Result;
use crate::models::{ObservedState, TurnResult};

use super::SessionBundle;

/// Run one chat turn against a session bundle. The caller appends the result
/// to the session history.
pub(super) fn run_turn(bundle: &mut SessionBundle, user_message: &str) -> Result<TurnResult> {
    let state = bundle.world.state()?;
    let urgency = bundle.gate.assess_triage(&state);
    let action = bundle.engine.choose_action(&state, user_message);
    let result = bundle.world.step(&action)?;

    // Re-observe: the action may have produced new facts or test results.
    let latest = bundle.world.state()?;
    let diagnosis = bundle.engine.infer_diagnosis(&latest);
    let recommendation = bundle.engine.treatment_plan(&diagnosis);
    let assessment = bundle.gate.evaluate(&latest, &diagnosis, urgency);

    let (guideline_refs, guideline_confidence) = guideline_refs(bundle, &latest, &diagnosis);
    let evidence_chain = bundle.engine.build_evidence_chain(&latest, &diagnosis);
    let diagnosis_confidence =
        bundle
            .engine
            .estimate_confidence(&latest, &diagnosis, guideline_confidence);
    let handoff = bundle.gate.handoff_decision(
        &diagnosis,
        assessment.emergency,
        assessment.dangerous_miss,
        diagnosis_confidence,
    );

    let message = compose_message(
        action.kind().as_str(),
        &result.observation,
        &diagnosis,
        &recommendation,
        &assessment.notice,
        &guideline_refs,
        &evidence_chain,
        diagnosis_confidence,
        &handoff,
    );

    Ok(TurnResult {
        message,
        action,
        result,
        diagnosis,
        recommendation,
        urgency,
        safety_notice: assessment.notice,
        emergency: assessment.emergency,
        red_flags: assessment.red_flags,
        dangerous_miss: assessment.dangerous_miss,
        guideline_refs,
        evidence_chain,
        diagnosis_confidence,
        escalate_to_human: handoff.escalate,
        refusal: handoff.refuse,
        refusal_reason: handoff.reason,
    })
}

/// Query the retriever with diagnosis plus accumulated evidence; returns the
/// citation lines and the best hit's confidence (0 when nothing matched).
fn guideline_refs(
    bundle: &SessionBundle,
    state: &ObservedState,
    diagnosis: &str,
) -> (Vec<String>, f64) {
    let query = format!(
        "{} {} {}",
        diagnosis,
        state.symptoms.join(" "),
        state
            .completed_tests
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(" ")
    );
    let hits = bundle.retriever.retrieve(&query, bundle.evidence_top_k);
    let confidence = hits
        .iter()
        .map(|h| h.confidence)
        .fold(0.0_f64, f64::max);
    let refs = hits.iter().map(|h| h.citation()).collect();
    (refs, confidence)
}

#[allow(clippy::too_many_arguments)]
fn compose_message(
    action_name: &str,
    observation: &str,
    diagnosis: &str,
    recommendation: &str,
    safety_notice: &str,
    guideline_refs: &[String],
    evidence_chain: &[String],
    diagnosis_confidence: f64,
    handoff: &crate::safety::HandoffDecision,
) -> String {
    let bullets = |items: &[String], empty: &str| -> String {
        if items.is_empty() {
            format!("- {empty}")
        } else {
            items
                .iter()
                .map(|x| format!("- {x}"))
                .collect::<Vec<_>>()
                .join("\n")
        }
    };
    let evidence = bullets(evidence_chain, "none");
    let refs = bullets(guideline_refs, "no matching guidelines");
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    let reason = if handoff.reason.is_empty() {
        "-"
    } else {
        &handoff.reason
    };

    format!(
        "[action] {action_name}\n\
         [observation] {observation}\n\
         [diagnosis] {diagnosis}\n\
         [confidence] {diagnosis_confidence:.3}\n\
         [evidence]\n{evidence}\n\
         [plan] {recommendation}\n\
         [safety] {safety_notice}\n\
         [guidelines]\n{refs}\n\
         [handoff] {handoff_flag}\n\
         [refusal] {refusal_flag}\n\
         [refusal reason] {reason}",
        handoff_flag = yes_no(handoff.escalate),
        refusal_flag = yes_no(handoff.refuse),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::HandoffDecision;

    #[test]
    fn test_compose_message_sections() {
        let handoff = HandoffDecision {
            escalate: true,
            refuse: true,
            reason: "red-flag emergency pattern detected; defer to emergency care".into(),
        };
        let message = compose_message(
            "order_test",
            "ST elevation in II, III, aVF",
            "acute inferior myocardial infarction",
            "Activate the emergency chest-pain pathway",
            "Red-flag rules fired",
            &["acs-001: Acute coronary syndrome | AHA | confidence=1.000".to_string()],
            &["ecg: ST elevation in II, III, aVF".to_string()],
            0.895,
            &handoff,
        );

        assert!(message.contains("[action] order_test"));
        assert!(message.contains("[confidence] 0.895"));
        assert!(message.contains("- ecg: ST elevation"));
        assert!(message.contains("[handoff] yes"));
        assert!(message.contains("[refusal reason] red-flag"));
    }

    #[test]
    fn test_compose_message_placeholders_when_empty() {
        let handoff = HandoffDecision {
            escalate: false,
            refuse: false,
            reason: String::new(),
        };
        let message = compose_message(
            "ask_question",
            "obs",
            "dx",
            "plan",
            "notice",
            &[],
            &[],
            0.2,
            &handoff,
        );
        assert!(message.contains("- none"));
        assert!(message.contains("- no matching guidelines"));
        assert!(message.contains("[refusal reason] -"));
    }
}
