//! Typed wrappers over [`VoyagerClient::send_command`]: each method is a
//! thin encode of a fixed protocol method name and parameter shape.

use serde_json::{Map, Value};

use crate::client::{CommandOutput, VoyagerClient};
use crate::error::ClientError;

/// Fixed mount motions accepted by `RemoteMountFastCommand`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MountAction {
    Track,
    NoTrack,
    Park,
    Unpark,
    GotoZenith,
    Home,
}

impl MountAction {
    fn command_type(self) -> i64 {
        match self {
            Self::Track => 1,
            Self::NoTrack => 2,
            Self::Park => 3,
            Self::Unpark => 4,
            Self::GotoZenith => 5,
            Self::Home => 6,
        }
    }
}

/// Precise-point target. Numeric and textual coordinates are mutually
/// exclusive on the wire; the enum makes that so by construction.
#[derive(Clone, Debug, PartialEq)]
pub enum PointTarget {
    Degrees { ra: f64, dec: f64 },
    Text { ra: String, dec: String },
}

fn toggle_params(enabled: bool) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("IsOn".into(), Value::from(enabled));
    params
}

fn log_event_params(enabled: bool, level: u8) -> Map<String, Value> {
    let mut params = toggle_params(enabled);
    params.insert("Level".into(), Value::from(level));
    params
}

fn precise_point_params(target: &PointTarget) -> Map<String, Value> {
    let mut params = Map::new();
    match target {
        PointTarget::Degrees { ra, dec } => {
            params.insert("IsText".into(), Value::from(false));
            params.insert("RA".into(), Value::from(*ra));
            params.insert("DEC".into(), Value::from(*dec));
            params.insert("RAText".into(), Value::from(""));
            params.insert("DECText".into(), Value::from(""));
        }
        PointTarget::Text { ra, dec } => {
            params.insert("IsText".into(), Value::from(true));
            params.insert("RA".into(), Value::from(0.0));
            params.insert("DEC".into(), Value::from(0.0));
            params.insert("RAText".into(), Value::from(ra.as_str()));
            params.insert("DECText".into(), Value::from(dec.as_str()));
        }
    }
    params.insert("Parallelized".into(), Value::from(false));
    params
}

fn mount_params(action: MountAction) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("CommandType".into(), Value::from(action.command_type()));
    params
}

fn profile_params(filename: &str) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("FileName".into(), Value::from(filename));
    params
}

impl VoyagerClient {
    /// Enable or disable log streaming at the given verbosity level.
    pub async fn set_log_events(&self, enabled: bool, level: u8) -> Result<CommandOutput, ClientError> {
        self.send_command("RemoteSetLogEvent", Some(log_event_params(enabled, level)), None)
            .await
    }

    /// Enable or disable dashboard mode.
    pub async fn set_dashboard(&self, enabled: bool) -> Result<CommandOutput, ClientError> {
        self.send_command("RemoteSetDashboardMode", Some(toggle_params(enabled)), None)
            .await
    }

    /// Fetch array element data.
    pub async fn array_element_data(&self) -> Result<CommandOutput, ClientError> {
        self.send_command("GetArrayElementData", None, None).await
    }

    /// Abort the remote action identified by `uid`.
    pub async fn abort_action(&self, uid: &str) -> Result<CommandOutput, ClientError> {
        self.send_command("RemoteActionAbort", None, Some(uid.to_string())).await
    }

    /// Fetch the active filter.
    pub async fn actual_filter(&self) -> Result<CommandOutput, ClientError> {
        self.send_command("RemoteFilterGetActual", None, None).await
    }

    /// Fetch the filter configuration.
    pub async fn filter_configuration(&self) -> Result<CommandOutput, ClientError> {
        self.send_command("RemoteGetFilterConfiguration", None, None).await
    }

    /// Fetch the CCD temperature.
    pub async fn ccd_temperature(&self) -> Result<CommandOutput, ClientError> {
        self.send_command("RemoteGetCCDTemperature", None, None).await
    }

    /// Connect the equipment setup.
    pub async fn connect_setup(&self) -> Result<CommandOutput, ClientError> {
        self.send_command("RemoteSetupConnect", None, None).await
    }

    /// Disconnect the equipment setup.
    pub async fn disconnect_setup(&self) -> Result<CommandOutput, ClientError> {
        self.send_command("RemoteSetupDisconnect", None, None).await
    }

    /// Precise-point the mount at a target.
    pub async fn precise_point_target(&self, target: PointTarget) -> Result<CommandOutput, ClientError> {
        self.send_command("RemotePrecisePointTarget", Some(precise_point_params(&target)), None)
            .await
    }

    /// Issue a fixed mount action.
    pub async fn mount_action(&self, action: MountAction) -> Result<CommandOutput, ClientError> {
        self.send_command("RemoteMountFastCommand", Some(mount_params(action)), None)
            .await
    }

    /// Load an equipment profile by filename.
    pub async fn set_profile(&self, filename: &str) -> Result<CommandOutput, ClientError> {
        self.send_command("RemoteSetProfile", Some(profile_params(filename)), None)
            .await
    }
}
