//! State transitions
//!
//! [`reduce`] is a pure function from the current state and an [`Action`] to
//! the next state. A rejected action returns an error and leaves the input
//! untouched; recording the error message is up to the caller.

use colloquy_core::{
    validate_roster_ids, Argument, ArgumentId, Debate, DebateFormat, Evidence, EvidenceId, Expert,
    MalformedDebateError, ParameterUpdate, Takeaways,
};

use crate::error::SessionError;
use crate::state::DebateSessionState;

/// A requested state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A provider request started
    StartLoading,
    /// Replace the current debate with a validated one
    LoadDebateSuccess(Debate),
    /// A loading request failed; the previous debate is kept
    LoadDebateError(String),
    /// A request failed without loading anything; the debate and the
    /// loading flag are kept
    InteractionError(String),
    SetExperts(Vec<Expert>),
    SelectArgument(Option<ArgumentId>),
    /// Open or close the evidence panel; `None` toggles
    ToggleEvidencePanel(Option<bool>),
    SelectEvidence(Option<EvidenceId>),
    UpdateParameters(ParameterUpdate),
    /// Append a new argument to the debate and select it
    AddArgument(Argument),
    /// Append a batch of arguments as one step and select the last.
    /// Either every argument is added or none is.
    AddArguments(Vec<Argument>),
    AttachEvidence {
        argument_id: ArgumentId,
        evidence: Vec<Evidence>,
    },
    SelectStage(usize),
    NextStage,
    PreviousStage,
    SetTakeaways(Takeaways),
    SetFormat(DebateFormat),
    /// Back to initial values, keeping the expert roster
    Reset,
}

impl Action {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartLoading => "start_loading",
            Self::LoadDebateSuccess(_) => "load_debate_success",
            Self::LoadDebateError(_) => "load_debate_error",
            Self::InteractionError(_) => "interaction_error",
            Self::SetExperts(_) => "set_experts",
            Self::SelectArgument(_) => "select_argument",
            Self::ToggleEvidencePanel(_) => "toggle_evidence_panel",
            Self::SelectEvidence(_) => "select_evidence",
            Self::UpdateParameters(_) => "update_parameters",
            Self::AddArgument(_) => "add_argument",
            Self::AddArguments(_) => "add_arguments",
            Self::AttachEvidence { .. } => "attach_evidence",
            Self::SelectStage(_) => "select_stage",
            Self::NextStage => "next_stage",
            Self::PreviousStage => "previous_stage",
            Self::SetTakeaways(_) => "set_takeaways",
            Self::SetFormat(_) => "set_format",
            Self::Reset => "reset",
        }
    }
}

/// Compute the state that follows `action`
pub fn reduce(
    state: &DebateSessionState,
    action: Action,
) -> Result<DebateSessionState, SessionError> {
    let mut next = state.clone();

    match action {
        Action::StartLoading => {
            next.loading = true;
            next.error = None;
        }

        Action::LoadDebateSuccess(debate) => {
            debate.validate()?;
            let same_debate = state.debate().is_some_and(|d| d.id == debate.id);
            if !same_debate {
                next.selected_argument_id = None;
                next.evidence_panel_open = false;
                next.selected_evidence_id = None;
                next.evidence.clear();
                next.takeaways = None;
            } else if next
                .selected_argument_id
                .as_ref()
                .is_some_and(|id| !debate.arguments.contains_key(id))
            {
                next.selected_argument_id = None;
            }
            next.format = debate.format;
            next.current_debate = Some(debate);
            next.current_stage_index = 0;
            next.loading = false;
            next.error = None;
        }

        Action::LoadDebateError(message) => {
            next.error = Some(message);
            next.loading = false;
        }

        Action::InteractionError(message) => {
            next.error = Some(message);
        }

        Action::SetExperts(experts) => {
            validate_roster_ids(experts.iter().map(|e| e.id.as_str()))?;
            next.experts = experts;
        }

        Action::SelectArgument(id) => {
            if let Some(id) = &id {
                if state.argument(id).is_none() {
                    return Err(SessionError::UnknownArgument(id.clone()));
                }
            }
            if id != state.selected_argument_id {
                next.evidence_panel_open = false;
                next.selected_evidence_id = None;
            }
            next.selected_argument_id = id;
        }

        Action::ToggleEvidencePanel(open) => {
            next.evidence_panel_open = open.unwrap_or(!state.evidence_panel_open);
        }

        Action::SelectEvidence(id) => {
            next.evidence_panel_open = id.is_some();
            next.selected_evidence_id = id;
        }

        Action::UpdateParameters(update) => {
            if let Some(depth) = update.depth {
                if !(0.0..=1.0).contains(&depth) {
                    return Err(SessionError::InvalidParameter {
                        name: "depth",
                        reason: format!("{} is outside [0, 1]", depth),
                    });
                }
            }
            next.parameters = update.apply_to(&state.parameters);
        }

        Action::AddArgument(argument) => append_arguments(&mut next, vec![argument])?,

        Action::AddArguments(arguments) => append_arguments(&mut next, arguments)?,

        Action::AttachEvidence {
            argument_id,
            evidence,
        } => {
            if state.argument(&argument_id).is_none() {
                return Err(SessionError::UnknownArgument(argument_id));
            }
            let cached = next.evidence.entry(argument_id).or_default();
            for record in evidence {
                match cached.iter_mut().find(|e| e.id == record.id) {
                    Some(existing) => *existing = record,
                    None => cached.push(record),
                }
            }
        }

        Action::SelectStage(index) => {
            let len = require_debate(state)?.stages.len();
            if index >= len {
                return Err(SessionError::StageOutOfRange { index, len });
            }
            next.current_stage_index = index;
        }

        Action::NextStage => {
            let len = require_debate(state)?.stages.len();
            next.current_stage_index = (state.current_stage_index + 1).min(len.saturating_sub(1));
        }

        Action::PreviousStage => {
            require_debate(state)?;
            next.current_stage_index = state.current_stage_index.saturating_sub(1);
        }

        Action::SetTakeaways(takeaways) => {
            next.takeaways = Some(takeaways);
            next.loading = false;
        }

        Action::SetFormat(format) => {
            next.format = format;
        }

        Action::Reset => {
            next = DebateSessionState {
                experts: state.experts.clone(),
                ..Default::default()
            };
        }
    }

    Ok(next)
}

/// Append to `next` in order; an error leaves `next` partly applied, so
/// callers must discard it
fn append_arguments(
    next: &mut DebateSessionState,
    arguments: Vec<Argument>,
) -> Result<(), SessionError> {
    let debate = next
        .current_debate
        .as_mut()
        .ok_or(SessionError::NoActiveDebate)?;
    let mut last = None;
    for argument in arguments {
        let id = argument.id.clone();
        debate.append_argument(argument).map_err(|e| match e {
            MalformedDebateError::DuplicateArgument(id) => SessionError::DuplicateArgument(id),
            other => SessionError::Malformed(other),
        })?;
        last = Some(id);
    }

    let Some(id) = last else {
        return Ok(());
    };
    if next.selected_argument_id.as_ref() != Some(&id) {
        next.evidence_panel_open = false;
        next.selected_evidence_id = None;
    }
    next.selected_argument_id = Some(id);
    Ok(())
}

fn require_debate(state: &DebateSessionState) -> Result<&Debate, SessionError> {
    state.debate().ok_or(SessionError::NoActiveDebate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::{catalog, ArgumentKind, Stage, StageKind};

    fn debate() -> Debate {
        let mut debate = Debate::new(
            "d1",
            "Should AI be regulated?",
            DebateFormat::Standard,
            vec!["technologist".into(), "ethicist".into()],
        );
        debate
            .append_argument(
                Argument::new("a1", ArgumentKind::Claim, "Regulate now").spoken_by("ethicist"),
            )
            .unwrap();
        debate
            .append_argument(
                Argument::new("a2", ArgumentKind::Counter, "Innovation first")
                    .spoken_by("technologist")
                    .opposing("a1"),
            )
            .unwrap();
        let mut intro = Stage::new("s1", StageKind::Introduction, "Introduction");
        intro.argument_ids = vec!["a1".into()];
        debate.append_stage(intro).unwrap();
        let mut exchange = Stage::new("s2", StageKind::Exchange, "Exchange");
        exchange.argument_ids = vec!["a2".into()];
        debate.append_stage(exchange).unwrap();
        debate
    }

    fn loaded() -> DebateSessionState {
        reduce(&DebateSessionState::default(), Action::LoadDebateSuccess(debate())).unwrap()
    }

    #[test]
    fn test_loading_flags() {
        let state = DebateSessionState {
            error: Some("old".into()),
            ..Default::default()
        };
        let state = reduce(&state, Action::StartLoading).unwrap();
        assert!(state.loading);
        assert!(state.error.is_none());

        let state = reduce(&state, Action::LoadDebateError("boom".into())).unwrap();
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_load_resets_cursor() {
        let state = reduce(&loaded(), Action::SelectStage(1)).unwrap();
        assert_eq!(state.current_stage_index, 1);
        let state = reduce(&state, Action::LoadDebateSuccess(debate())).unwrap();
        assert_eq!(state.current_stage_index, 0);
        assert_eq!(state.arguments().len(), 2);
    }

    #[test]
    fn test_malformed_debate_rejected() {
        let mut bad = debate();
        bad.expert_ids.push("technologist".into());
        let err = reduce(&DebateSessionState::default(), Action::LoadDebateSuccess(bad));
        assert!(matches!(err, Err(SessionError::Malformed(_))));
    }

    #[test]
    fn test_roster_rejected() {
        let one = catalog()[..1].to_vec();
        let err = reduce(&DebateSessionState::default(), Action::SetExperts(one));
        assert!(matches!(err, Err(SessionError::Roster(_))));
    }

    #[test]
    fn test_select_argument_closes_panel() {
        let state = reduce(&loaded(), Action::SelectArgument(Some("a1".into()))).unwrap();
        let state = reduce(&state, Action::SelectEvidence(Some("ev".into()))).unwrap();
        assert!(state.evidence_panel_open);

        let same = reduce(&state, Action::SelectArgument(Some("a1".into()))).unwrap();
        assert!(same.evidence_panel_open);

        let other = reduce(&state, Action::SelectArgument(Some("a2".into()))).unwrap();
        assert!(!other.evidence_panel_open);
        assert!(other.selected_evidence_id.is_none());

        let err = reduce(&state, Action::SelectArgument(Some("zz".into())));
        assert_eq!(err, Err(SessionError::UnknownArgument("zz".into())));
    }

    #[test]
    fn test_toggle_panel() {
        let state = loaded();
        let open = reduce(&state, Action::ToggleEvidencePanel(None)).unwrap();
        assert!(open.evidence_panel_open);
        let closed = reduce(&open, Action::ToggleEvidencePanel(None)).unwrap();
        assert!(!closed.evidence_panel_open);
        let forced = reduce(&open, Action::ToggleEvidencePanel(Some(true))).unwrap();
        assert!(forced.evidence_panel_open);
    }

    #[test]
    fn test_add_argument_selects_it() {
        let arg = Argument::new("a3", ArgumentKind::Response, "Both").supporting("a1");
        let state = reduce(&loaded(), Action::AddArgument(arg)).unwrap();
        assert_eq!(state.selected_argument_id.as_deref(), Some("a3"));
        assert!(state.argument("a3").is_some());
    }

    #[test]
    fn test_add_argument_rejections() {
        let state = loaded();
        let dup = Argument::new("a1", ArgumentKind::Claim, "Again");
        assert_eq!(
            reduce(&state, Action::AddArgument(dup)),
            Err(SessionError::DuplicateArgument("a1".into()))
        );

        let dangling = Argument::new("a3", ArgumentKind::Response, "?").opposing("missing");
        assert!(matches!(
            reduce(&state, Action::AddArgument(dangling.clone())),
            Err(SessionError::Malformed(MalformedDebateError::DanglingArgument { .. }))
        ));

        assert_eq!(
            reduce(&DebateSessionState::default(), Action::AddArgument(dangling)),
            Err(SessionError::NoActiveDebate)
        );
    }

    #[test]
    fn test_add_arguments_all_or_nothing() {
        let state = loaded();
        let batch = vec![
            Argument::new("a3", ArgumentKind::Response, "Partly").supporting("a1"),
            Argument::new("a4", ArgumentKind::Counter, "Ghost").opposing("ghost"),
        ];
        assert!(matches!(
            reduce(&state, Action::AddArguments(batch)),
            Err(SessionError::Malformed(MalformedDebateError::DanglingArgument { .. }))
        ));

        let batch = vec![
            Argument::new("a3", ArgumentKind::Response, "Partly").supporting("a1"),
            Argument::new("a4", ArgumentKind::Counter, "Not quite").opposing("a3"),
        ];
        let next = reduce(&state, Action::AddArguments(batch)).unwrap();
        assert_eq!(next.arguments().len(), 4);
        assert_eq!(next.selected_argument_id.as_deref(), Some("a4"));

        let unchanged = reduce(&state, Action::AddArguments(Vec::new())).unwrap();
        assert_eq!(unchanged, state);
    }

    #[test]
    fn test_interaction_error_keeps_loading() {
        let state = reduce(&loaded(), Action::StartLoading).unwrap();
        let state = reduce(&state, Action::InteractionError("no answer".into())).unwrap();
        assert!(state.loading);
        assert_eq!(state.error.as_deref(), Some("no answer"));
        assert!(state.current_debate.is_some());
    }

    #[test]
    fn test_stage_cursor() {
        let state = loaded();
        assert_eq!(
            reduce(&state, Action::SelectStage(2)),
            Err(SessionError::StageOutOfRange { index: 2, len: 2 })
        );
        let state = reduce(&state, Action::NextStage).unwrap();
        let state = reduce(&state, Action::NextStage).unwrap();
        assert_eq!(state.current_stage_index, 1);
        let state = reduce(&state, Action::PreviousStage).unwrap();
        let state = reduce(&state, Action::PreviousStage).unwrap();
        assert_eq!(state.current_stage_index, 0);
    }

    #[test]
    fn test_invalid_depth() {
        let err = reduce(&loaded(), Action::UpdateParameters(ParameterUpdate::depth(1.5)));
        assert!(matches!(err, Err(SessionError::InvalidParameter { name: "depth", .. })));
    }

    #[test]
    fn test_reset_keeps_roster() {
        let roster = catalog()[..3].to_vec();
        let state = reduce(&loaded(), Action::SetExperts(roster.clone())).unwrap();
        let state = reduce(&state, Action::SetTakeaways(Takeaways::default())).unwrap();
        let state = reduce(&state, Action::Reset).unwrap();
        assert_eq!(state.experts, roster);
        assert!(state.current_debate.is_none());
        assert!(state.takeaways.is_none());
    }
}
