//! Call environment shielding
//!
//! Third-party device modules are routinely incompatible with themed UI
//! contexts and with non-default display scaling. Every protocol call runs
//! inside an `EnvGuard` that deactivates the host styling context and drops
//! the calling thread to the legacy scaling level, then restores both when
//! the call returns, on every exit path.

/// Thread display-scaling awareness levels, least-aware first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingAwareness {
    Unaware,
    System,
    PerMonitor,
    PerMonitorV2,
}

/// Opaque cookie returned when the styling context is deactivated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylingToken(pub u64);

/// Host environment toggles used around each protocol call.
pub trait CallEnv {
    /// Set the calling thread's scaling awareness, returning the previous
    /// level.
    fn set_scaling_awareness(&mut self, level: ScalingAwareness) -> ScalingAwareness;

    /// Deactivate the host UI styling context. The returned token must be
    /// passed back to `restore_styling`.
    fn deactivate_styling(&mut self) -> StylingToken;

    fn restore_styling(&mut self, token: StylingToken);
}

/// RAII scope for one protocol call.
///
/// Acquisition order matches release order in reverse: styling is
/// deactivated before scaling is lowered, and reactivated after scaling is
/// restored.
pub struct EnvGuard<'a, E: CallEnv> {
    env: &'a mut E,
    prev_level: ScalingAwareness,
    token: Option<StylingToken>,
}

impl<'a, E: CallEnv> EnvGuard<'a, E> {
    pub fn activate(env: &'a mut E) -> Self {
        let token = env.deactivate_styling();
        let prev_level = env.set_scaling_awareness(ScalingAwareness::Unaware);
        Self {
            env,
            prev_level,
            token: Some(token),
        }
    }
}

impl<E: CallEnv> Drop for EnvGuard<'_, E> {
    fn drop(&mut self) {
        self.env.set_scaling_awareness(self.prev_level);
        if let Some(token) = self.token.take() {
            self.env.restore_styling(token);
        }
    }
}

/// Environment for platforms and tests where neither toggle applies.
#[derive(Debug, Clone)]
pub struct NoopEnv {
    level: ScalingAwareness,
}

impl Default for NoopEnv {
    fn default() -> Self {
        Self {
            level: ScalingAwareness::PerMonitorV2,
        }
    }
}

impl CallEnv for NoopEnv {
    fn set_scaling_awareness(&mut self, level: ScalingAwareness) -> ScalingAwareness {
        std::mem::replace(&mut self.level, level)
    }

    fn deactivate_styling(&mut self) -> StylingToken {
        StylingToken(0)
    }

    fn restore_styling(&mut self, _token: StylingToken) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every toggle so tests can assert ordering and restoration.
    #[derive(Default)]
    struct RecordingEnv {
        level: Option<ScalingAwareness>,
        log: Vec<String>,
    }

    impl CallEnv for RecordingEnv {
        fn set_scaling_awareness(&mut self, level: ScalingAwareness) -> ScalingAwareness {
            self.log.push(format!("scaling={level:?}"));
            self.level.replace(level).unwrap_or(ScalingAwareness::PerMonitorV2)
        }

        fn deactivate_styling(&mut self) -> StylingToken {
            self.log.push("styling-off".into());
            StylingToken(42)
        }

        fn restore_styling(&mut self, token: StylingToken) {
            self.log.push(format!("styling-on({})", token.0));
        }
    }

    #[test]
    fn test_guard_restores_previous_level() {
        let mut env = RecordingEnv::default();
        env.set_scaling_awareness(ScalingAwareness::PerMonitor);
        {
            let _guard = EnvGuard::activate(&mut env);
        }
        assert_eq!(env.level, Some(ScalingAwareness::PerMonitor));
    }

    #[test]
    fn test_guard_order_is_symmetric() {
        let mut env = RecordingEnv::default();
        {
            let _guard = EnvGuard::activate(&mut env);
        }
        assert_eq!(
            env.log,
            vec![
                "styling-off",
                "scaling=Unaware",
                "scaling=PerMonitorV2",
                "styling-on(42)",
            ]
        );
    }

    #[test]
    fn test_noop_env_round_trips() {
        let mut env = NoopEnv::default();
        let prev = env.set_scaling_awareness(ScalingAwareness::Unaware);
        assert_eq!(prev, ScalingAwareness::PerMonitorV2);
        assert_eq!(
            env.set_scaling_awareness(prev),
            ScalingAwareness::Unaware
        );
    }
}
