/// Key families shared with any other tooling that reads the store.
///
/// Project-scoped keys embed the project name; inboxes, handover results
/// and session snapshots are global because their ids are unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keys {
    project: String,
}

impl Keys {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn state(&self) -> String {
        format!("ada:bb:{}:state", self.project)
    }

    pub fn decisions(&self) -> String {
        format!("ada:bb:{}:decisions", self.project)
    }

    pub fn layer_counter(&self) -> String {
        format!("ada:bb:{}:ice_cake", self.project)
    }

    pub fn handover(&self, handover_id: &str) -> String {
        format!("ada:bb:{}:handover:{handover_id}", self.project)
    }

    pub fn agents(&self) -> String {
        format!("ada:bb:{}:agents", self.project)
    }

    pub fn session_log(&self) -> String {
        format!("ada:bb:{}:log", self.project)
    }

    pub fn watermarks(&self) -> String {
        format!("ada:bb:{}:watermarks", self.project)
    }

    pub fn inbox(agent: &str) -> String {
        format!("ada:a2a:inbox:{agent}")
    }

    pub fn handover_result(handover_id: &str) -> String {
        format!("ada:a2a:result:{handover_id}")
    }

    pub fn session_snapshot(session_id: &str) -> String {
        format!("ada:session:{session_id}")
    }

    pub fn latest_session(&self) -> String {
        format!("ada:session:latest:{}", self.project)
    }

    pub fn broadcast_channel(&self, agent: &str) -> String {
        format!("ada:broadcast:{}:{agent}", self.project)
    }

    pub fn broadcast_acks(&self, broadcast_id: &str) -> String {
        format!("ada:broadcast:{}:ack:{broadcast_id}", self.project)
    }

    pub fn task(&self, task_id: &str) -> String {
        format!("ada:tasks:{}:{task_id}", self.project)
    }

    pub fn task_queue(&self, agent: &str) -> String {
        format!("ada:tasks:{}:queue:{agent}", self.project)
    }

    pub fn task_board(&self) -> String {
        format!("ada:tasks:{}:board", self.project)
    }

    /// Lives on the hot store.
    pub fn agent_profile(agent: &str) -> String {
        format!("ada:agent:{agent}:status")
    }
}
