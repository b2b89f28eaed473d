//! Static descriptions for numerically-coded protocol values: signal codes,
//! remote action results, and log levels. Strings match the host application
//! verbatim, including its punctuation.

/// Log level name and meaning as documented by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogLevel {
    pub level: &'static str,
    pub desc: &'static str,
}

/// Human-readable description for a `Signal` message's `Code`.
pub fn signal_description(code: i64) -> Option<&'static str> {
    let desc = match code {
        1 => "Autofocus Error",
        2 => "Remote Action RUN - Running Queue is empty",
        3 => "Remote Action RUN - SC ARRAY Autofocus all nodes",
        4 => "Remote Action RUN - Precise Pointing",
        5 => "Remote Action RUN - Autofocus",
        6 => "Remote Action RUN - SC ARRAY AutoFlat single node",
        7 => "Remote Action RUN - SC ARRAY Autofocus single node",
        8 => "Remote Action RUN - SC ARRAY Connect Setup all nodes",
        9 => "Remote Action RUN - SC ARRAY Disconnect Setup all nodes",
        10 => "Remote Action RUN - SC ARRAY Filter Change single node",
        11 => "Remote Action RUN - SC ARRAY Get Actual Filter single node",
        12 => "Remote Action RUN - SC ARRAY Focuser Move To single node",
        13 => "Remote Action RUN - SC ARRAY Focuser Offset single node",
        14 => "Remote Action RUN - SC ARRAY Rotator Move single node",
        15 => "Remote Action RUN - Setup Connect",
        16 => "Remote Action RUN - Setup Disconnect",
        18 => "Remote Action RUN - Camera Shot",
        19 => "Remote Action RUN - CCD Cooling",
        20 => "Remote Action RUN - Focuser Move To",
        21 => "Remote Action RUN - Focuser OffSet",
        22 => "Remote Action RUN - Rotator Goto",
        23 => "Remote Action RUN - AutoFlat",
        24 => "Remote Action RUN - Filter Change To",
        25 => "Remote Action RUN - Plate Solving Actual Location",
        26 => "Remote Action RUN - SC ARRAY Sequence",
        27 => "Remote Action RUN – SC ARRAY Create Directory on FileSystem single node",
        28 => "Remote Action RUN – SC ARRAY CCD Cooling single node",
        29 => "Remote Action RUN - SC ARRAY Get CCD Temperature single node",
        30 => "Remote Action RUN - SC ARRAY Camera Shot single node",
        31 => "Remote Action RUN - Telescope Goto",
        32 => "Remote Action RUN - Run External Script/Application",
        33 => "Remote Action RUN - SC ARRAY AutoFocus all node with LocalField method",
        34 => "Remote Action RUN - SC ARRAY AutoFocus single node with LocalField method",
        500 => "VOYAGER General STATUS - Error (some error from action or thread raised)",
        501 => "VOYAGER General STATUS - Idle (nothing to do ready to work)",
        502 => "VOYAGER General STATUS - Action Running",
        503 => "VOYAGER General STATUS - Action Stopped",
        504 => "VOYAGER General STATUS - Undefined (just started Voyager ... nothing defined)",
        505 => "VOYAGER General STATUS - Warning (some minor error from action or thread raised)",
        506 => "VOYAGER General STATUS - Unknow (Internal Automa cannot understand what asked to Voyager)",
        _ => return None,
    };
    Some(desc)
}

/// Human-readable description for a command result's `ActionResultInt`.
pub fn action_result_description(code: i64) -> Option<&'static str> {
    let desc = match code {
        0 => "NEED INIT",
        1 => "READY",
        2 => "RUNNING",
        3 => "PAUSE",
        4 => "OK",
        5 => "FINISHED ERROR",
        6 => "ABORTING",
        7 => "ABORTED",
        8 => "TIMEOUT",
        9 => "TIME END",
        10 => "OK PARTIAL",
        _ => return None,
    };
    Some(desc)
}

/// Name and meaning of a `LogEvent` verbosity level.
pub fn log_level_text(level: i64) -> Option<LogLevel> {
    let entry = match level {
        1 => LogLevel { level: "DEBUG", desc: "Low level info" },
        2 => LogLevel { level: "INFO", desc: "Normal Info" },
        3 => LogLevel { level: "WARNING", desc: "Warning info" },
        4 => LogLevel { level: "CRITICAL", desc: "Critical info like an error" },
        5 => LogLevel { level: "TITLE", desc: "Action running title" },
        6 => LogLevel { level: "SUBTITLE", desc: "SubAction running title" },
        7 => LogLevel { level: "EVENT", desc: "Event" },
        8 => LogLevel { level: "REQUEST", desc: "Command" },
        9 => LogLevel { level: "EMERGENCY", desc: "Emergency Management" },
        _ => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_status_description() {
        assert_eq!(
            signal_description(501),
            Some("VOYAGER General STATUS - Idle (nothing to do ready to work)")
        );
    }

    #[test]
    fn unknown_signal_is_none() {
        assert_eq!(signal_description(0), None);
        assert_eq!(signal_description(17), None); // gap in the host's table
        assert_eq!(signal_description(999), None);
    }

    #[test]
    fn action_result_bounds() {
        assert_eq!(action_result_description(0), Some("NEED INIT"));
        assert_eq!(action_result_description(4), Some("OK"));
        assert_eq!(action_result_description(10), Some("OK PARTIAL"));
        assert_eq!(action_result_description(11), None);
        assert_eq!(action_result_description(-1), None);
    }

    #[test]
    fn log_levels() {
        let info = log_level_text(2).unwrap();
        assert_eq!(info.level, "INFO");
        assert_eq!(info.desc, "Normal Info");
        assert!(log_level_text(0).is_none());
        assert!(log_level_text(10).is_none());
    }
}
