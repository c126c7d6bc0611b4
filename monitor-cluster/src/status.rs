#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MonitorStatus {
    Connecting { generation: u64 },
    Running { generation: u64 },
    Restarting { generation: u64 },
    Stopped,
}

impl MonitorStatus {
    pub fn generation(&self) -> Option<u64> {
        match self {
            MonitorStatus::Connecting { generation }
            | MonitorStatus::Running { generation }
            | MonitorStatus::Restarting { generation } => Some(*generation),
            MonitorStatus::Stopped => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, MonitorStatus::Running { .. })
    }
}
