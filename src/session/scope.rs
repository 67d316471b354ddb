use crate::util::new_session_id;

/// Who is acting: the project, the agent, and this session's id.
///
/// Created once per session and shared by every component working on
/// behalf of that session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionScope {
    pub project: String,
    pub agent_id: String,
    pub session_id: String,
}

impl SessionScope {
    pub fn new(project: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self::with_session_id(project, agent_id, new_session_id())
    }

    pub fn with_session_id(
        project: impl Into<String>,
        agent_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            agent_id: agent_id.into(),
            session_id: session_id.into(),
        }
    }
}
