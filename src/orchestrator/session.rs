use crate::request::RequestDescriptor;
use crate::response::ResponseOutcome;

use super::logs::LogRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Building,
    Executing,
    Succeeded,
    Failed,
}

/// Everything the operator can currently see. Handed out as a clone so
/// readers never observe a half-applied transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub phase: Phase,
    pub sequence: u64,
    pub request: Option<RequestDescriptor>,
    pub outcome: Option<ResponseOutcome>,
    pub correlation_id: String,
    pub elapsed_seconds: Option<f64>,
    pub logs: Option<Vec<LogRecord>>,
    pub message: Option<String>,
}

#[derive(Debug, Default)]
pub(super) struct Session {
    pub view: Snapshot,
    pub log_sequence: u64,
    build: u64,
}

impl Session {
    /// Moves into `Building` and returns the token that owns the build.
    /// `None` while another build or an execution is under way.
    pub fn begin_build(&mut self) -> Option<u64> {
        if matches!(self.view.phase, Phase::Building | Phase::Executing) {
            return None;
        }
        self.build += 1;
        self.view.phase = Phase::Building;
        Some(self.build)
    }

    /// Leaves `Building` and records the resolved request, unless the build
    /// was taken over by `abandon` or an execution in the meantime.
    pub fn finish_build(
        &mut self,
        token: u64,
        request: Option<&RequestDescriptor>,
        message: Option<String>,
    ) -> bool {
        if self.view.phase != Phase::Building || self.build != token {
            return false;
        }
        self.view.phase = Phase::Idle;
        self.view.request = request.cloned();
        self.view.message = message;
        true
    }

    /// Moves into `Executing` for a new request and returns its sequence
    /// number. Results of any earlier request become stale.
    pub fn begin_execution(&mut self, request: &RequestDescriptor) -> u64 {
        self.build += 1;
        self.view.sequence += 1;
        self.log_sequence += 1;
        self.view.phase = Phase::Executing;
        self.view.request = Some(request.clone());
        self.view.outcome = None;
        self.view.correlation_id.clear();
        self.view.elapsed_seconds = None;
        self.view.logs = None;
        self.view.message = None;
        self.view.sequence
    }

    pub fn is_current(&self, sequence: u64) -> bool {
        self.view.sequence == sequence
    }

    pub fn finish(&mut self, outcome: &ResponseOutcome) {
        self.view.phase = if outcome.is_success() {
            Phase::Succeeded
        } else {
            Phase::Failed
        };
        self.view.correlation_id = outcome.correlation_id().to_string();
        self.view.elapsed_seconds = outcome.elapsed_seconds();
        self.view.outcome = Some(outcome.clone());
    }

    pub fn abandon(&mut self) {
        self.build += 1;
        self.view.sequence += 1;
        self.view.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::split_url;

    fn request() -> RequestDescriptor {
        RequestDescriptor {
            method: "GET".to_string(),
            url: "https://api.example.com/a".to_string(),
            headers: Vec::new(),
            body: None,
            source: split_url("https://api.example.com/a").unwrap(),
        }
    }

    #[test]
    fn second_build_is_refused_while_one_is_running() {
        let mut session = Session::default();
        let token = session.begin_build().unwrap();
        assert_eq!(session.begin_build(), None);

        assert!(session.finish_build(token, Some(&request()), None));
        assert_eq!(session.view.phase, Phase::Idle);
        assert!(session.begin_build().is_some());
    }

    #[test]
    fn overtaken_build_leaves_the_execution_alone() {
        let mut session = Session::default();
        let token = session.begin_build().unwrap();
        session.abandon();
        let sequence = session.begin_execution(&request());

        assert!(!session.finish_build(token, None, Some("late".to_string())));
        assert_eq!(session.view.phase, Phase::Executing);
        assert_eq!(session.view.message, None);
        assert!(session.is_current(sequence));
        assert_eq!(session.begin_build(), None);
    }
}
