use anyhow::Result;
use gym_dmc_core::{
    dummy::DummyEnv,
    error::GymDmcError,
    wrappers::{
        FlattenObservation, ObservationByKey, OrderEnforcing, TimeLimit,
        ORIGINAL_OBSERVATION_KEY, TRUNCATED_KEY,
    },
    Array, Env, Observation, RenderMode, RenderOpts,
};

fn act(x: f64) -> Array {
    Array::from(vec![x])
}

fn error_kind(e: &anyhow::Error) -> Option<&GymDmcError> {
    e.downcast_ref::<GymDmcError>()
}

#[test]
fn test_order_enforcing() -> Result<()> {
    let mut env = OrderEnforcing::new(DummyEnv::new(Some(2)));
    let err = env.step(&act(0.0)).unwrap_err();
    assert_eq!(error_kind(&err), Some(&GymDmcError::ResetNeeded("step")));
    let err = env.render(RenderMode::Rgb, &RenderOpts::default()).unwrap_err();
    assert_eq!(error_kind(&err), Some(&GymDmcError::ResetNeeded("render")));

    env.reset()?;
    assert!(!env.step(&act(0.0))?.is_done());
    assert!(env.step(&act(0.0))?.is_terminated);

    // The episode is over.
    assert!(env.step(&act(0.0)).is_err());
    env.reset()?;
    assert!(env.step(&act(0.0)).is_ok());
    Ok(())
}

#[test]
fn test_time_limit_truncates() -> Result<()> {
    let mut env = TimeLimit::new(DummyEnv::new(None), 3);
    assert_eq!(env.max_episode_steps(), Some(3));
    assert!(env.step(&act(0.0)).is_err());

    env.reset()?;
    for _ in 0..2 {
        let step = env.step(&act(0.5))?;
        assert!(!step.is_done());
        assert!(!step.info.contains_key(TRUNCATED_KEY));
    }
    let step = env.step(&act(0.5))?;
    assert!(step.is_truncated);
    assert!(!step.is_terminated);
    assert!(step.info.get_bool(TRUNCATED_KEY)?);

    env.reset()?;
    assert_eq!(env.elapsed_steps(), Some(0));
    Ok(())
}

#[test]
fn test_time_limit_ignores_failed_steps() -> Result<()> {
    let mut env = TimeLimit::new(DummyEnv::new(None), 3);
    env.reset()?;
    let bad = Array::from(vec![0.0, 0.0]);
    for _ in 0..2 {
        let err = env.step(&bad).unwrap_err();
        assert!(matches!(error_kind(&err), Some(GymDmcError::InvalidAction(_))));
    }
    assert_eq!(env.elapsed_steps(), Some(0));

    for _ in 0..2 {
        assert!(!env.step(&act(0.0))?.is_done());
    }
    assert!(env.step(&bad).is_err());
    assert_eq!(env.elapsed_steps(), Some(2));
    assert!(env.step(&act(0.0))?.is_truncated);
    Ok(())
}

#[test]
fn test_time_limit_does_not_override_termination() -> Result<()> {
    let mut env = TimeLimit::new(DummyEnv::new(Some(2)), 2);
    env.reset()?;
    env.step(&act(0.0))?;
    let step = env.step(&act(0.0))?;
    assert!(step.is_terminated);
    assert!(!step.is_truncated);
    assert!(!step.info.get_bool(TRUNCATED_KEY)?);
    Ok(())
}

#[test]
fn test_flatten_observation() -> Result<()> {
    let mut env = FlattenObservation::new(DummyEnv::new(None), true);
    assert_eq!(env.observation_space().shape(), Some(&[3usize][..]));

    let obs = env.reset()?;
    assert!(env.observation_space().contains(&obs));

    let step = env.step(&act(0.25))?;
    // position (2) then velocity (1)
    assert_eq!(
        step.obs.as_array().unwrap().to_flat_vec::<f64>(),
        vec![0.25, 1.0, 0.25]
    );
    assert_eq!(step.reward, 1.0);

    let original = step.info.get_observation(ORIGINAL_OBSERVATION_KEY)?;
    assert_eq!(
        original.get("velocity").unwrap().to_flat_vec::<f64>(),
        vec![0.25]
    );
    Ok(())
}

#[test]
fn test_flatten_without_original() -> Result<()> {
    let mut env = FlattenObservation::new(DummyEnv::new(None), false);
    env.reset()?;
    let step = env.step(&act(0.0))?;
    assert!(step.info.is_empty());
    Ok(())
}

#[test]
fn test_observation_by_key() -> Result<()> {
    let mut env = ObservationByKey::new(DummyEnv::new(None), "velocity")?;
    assert_eq!(env.observation_space().shape(), Some(&[1usize][..]));

    let obs = env.reset()?;
    assert_eq!(obs, Observation::Array(Array::from(vec![0.0])));

    for i in 1..4 {
        let step = env.step(&act(1.0))?;
        assert_eq!(step.obs.as_array().unwrap().to_flat_vec::<f64>(), vec![i as f64]);
    }
    Ok(())
}

#[test]
fn test_observation_by_key_fails_eagerly() {
    let err = ObservationByKey::new(DummyEnv::new(None), "pixels")
        .err()
        .unwrap();
    match error_kind(&err) {
        Some(GymDmcError::MissingObservationKey { key, available }) => {
            assert_eq!(key, "pixels");
            assert_eq!(available, &vec!["position".to_string(), "velocity".to_string()]);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_wrappers_compose() -> Result<()> {
    let env = FlattenObservation::new(DummyEnv::new(None), false);
    let env = TimeLimit::new(OrderEnforcing::new(env), 2);
    let mut env: Box<dyn Env> = Box::new(env);

    env.seed(42);
    let a = env.sample_action();
    assert!(env.action_space().contains(&Observation::Array(a.clone())));

    env.reset()?;
    assert!(!env.step(&a)?.is_done());
    assert!(env.step(&a)?.is_truncated);
    env.close()?;
    env.close()?;
    Ok(())
}
