#[cfg(test)]
mod tests {
    use crate::types::*;
    use crate::updates::{DefinitionUpdates, RunUpdates};

    fn sample_run() -> Run {
        Run {
            run_id: new_run_id(),
            definition_id: "def-1".into(),
            cluster_name: "cluster-a".into(),
            status: RunStatus::Queued,
            group_name: "grp".into(),
            user: "alice".into(),
            env: Some(EnvList(vec![
                EnvVar::new("FOO", "bar"),
                EnvVar::new("BAZ", "qüx"),
            ])),
            ..Default::default()
        }
    }

    #[test]
    fn status_parses_closed_set() {
        assert_eq!(RunStatus::parse("QUEUED"), Some(RunStatus::Queued));
        assert_eq!(RunStatus::parse("PENDING"), Some(RunStatus::Pending));
        assert_eq!(RunStatus::parse("RUNNING"), Some(RunStatus::Running));
        assert_eq!(RunStatus::parse("STOPPED"), Some(RunStatus::Stopped));
        assert_eq!(RunStatus::parse("queued"), None);
        assert_eq!(RunStatus::parse("NEEDS_RETRY"), None);
    }

    #[test]
    fn stopped_is_the_only_terminal_status() {
        for status in RunStatus::ALL {
            assert_eq!(status.is_terminal(), *status == RunStatus::Stopped);
        }
    }

    #[test]
    fn run_message_omits_empty_fields() {
        let run = Run {
            run_id: "r-1".into(),
            status: RunStatus::Queued,
            ..Default::default()
        };
        let json = serde_json::to_value(&run).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.get("run_id").unwrap(), "r-1");
        assert_eq!(obj.get("status").unwrap(), "QUEUED");
        assert!(!obj.contains_key("task_arn"));
        assert!(!obj.contains_key("exit_code"));
        assert!(!obj.contains_key("env"));
    }

    #[test]
    fn run_message_round_trips() {
        let run = sample_run();
        let json = serde_json::to_string(&run).unwrap();
        let back: Run = serde_json::from_str(&json).unwrap();
        assert_eq!(run, back);
    }

    #[test]
    fn run_message_tolerates_unknown_fields() {
        let json = r#"{
            "run_id": "r-2",
            "status": "RUNNING",
            "cluster_name": "c1",
            "some_future_field": {"nested": true}
        }"#;
        let run: Run = serde_json::from_str(json).unwrap();
        assert_eq!(run.run_id, "r-2");
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.cluster_name, "c1");
    }

    #[test]
    fn new_run_ids_are_unique_uuids() {
        let a = new_run_id();
        let b = new_run_id();
        assert_ne!(a, b);
        assert_eq!(uuid::Uuid::parse_str(&a).unwrap().get_version_num(), 4);
    }

    #[test]
    fn env_list_lookups() {
        let env = EnvList(vec![EnvVar::new("A", "1"), EnvVar::new("B", "2")]);
        assert_eq!(env.get("A"), Some("1"));
        assert_eq!(env.get("C"), None);
        assert!(env.contains_pair("B", "2"));
        assert!(!env.contains_pair("B", "3"));
    }

    #[test]
    fn definition_updates_merge_partially() {
        let mut def = Definition {
            definition_id: "def-1".into(),
            alias: "old-alias".into(),
            image: "img:1".into(),
            memory: 512,
            env: Some(EnvList(vec![EnvVar::new("KEEP", "me")])),
            ports: Some(PortsList(vec![80])),
            ..Default::default()
        };
        DefinitionUpdates {
            alias: Some("new-alias".into()),
            memory: Some(1024),
            ..Default::default()
        }
        .apply_to(&mut def);

        assert_eq!(def.alias, "new-alias");
        assert_eq!(def.memory, 1024);
        assert_eq!(def.image, "img:1");
        assert_eq!(def.env, Some(EnvList(vec![EnvVar::new("KEEP", "me")])));
        assert_eq!(def.ports, Some(PortsList(vec![80])));
    }

    #[test]
    fn definition_updates_replace_whole_env_list() {
        let mut def = Definition {
            definition_id: "def-1".into(),
            env: Some(EnvList(vec![EnvVar::new("A", "1"), EnvVar::new("B", "2")])),
            ..Default::default()
        };
        DefinitionUpdates {
            env: Some(EnvList(vec![EnvVar::new("C", "3")])),
            ..Default::default()
        }
        .apply_to(&mut def);

        assert_eq!(def.env, Some(EnvList(vec![EnvVar::new("C", "3")])));
    }

    #[test]
    fn run_updates_keep_exit_code_when_absent() {
        let mut run = sample_run();
        run.exit_code = Some(137);
        RunUpdates {
            status: Some(RunStatus::Stopped),
            ..Default::default()
        }
        .apply_to(&mut run);

        assert_eq!(run.status, RunStatus::Stopped);
        assert_eq!(run.exit_code, Some(137));
    }

    #[test]
    fn run_updates_set_status_and_exit_code_only() {
        let mut run = sample_run();
        run.status = RunStatus::Running;
        let before = run.clone();

        RunUpdates {
            status: Some(RunStatus::Stopped),
            exit_code: Some(0),
            ..Default::default()
        }
        .apply_to(&mut run);

        assert_eq!(run.status, RunStatus::Stopped);
        assert_eq!(run.exit_code, Some(0));
        assert_eq!(run.cluster_name, before.cluster_name);
        assert_eq!(run.env, before.env);
        assert_eq!(run.user, before.user);
    }
}
