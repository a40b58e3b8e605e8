//! One monitoring pass over every configured target.

#![allow(missing_docs)]

use chrono::Local;

use super::probe::{ProbeRunner, SystemPing, probe};
use crate::core::config::{GlobalConfig, Target, TargetSet};
use crate::core::errors::{MonitorError, Result};
use crate::logger::MonitorLogger;
use crate::notify::{Notifier, Recipients, SmtpNotifier, compose_failure_mail};

/// What happened to a single target during a pass.
#[derive(Debug)]
pub enum TargetOutcome {
    Reachable { message: Option<String> },
    Notified { recipients: Recipients },
    Failed { error: MonitorError },
}

/// Sequential monitor: probes each target, mails on failure, isolates errors per target.
pub struct Monitor {
    config: GlobalConfig,
    targets: TargetSet,
    runner: Box<dyn ProbeRunner>,
    notifier: Box<dyn Notifier>,
    logger: MonitorLogger,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("config", &self.config)
            .field("targets", &self.targets)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Monitor wired to the system probe utility and the configured mail relay.
    #[must_use]
    pub fn new(config: GlobalConfig, targets: TargetSet, logger: MonitorLogger) -> Self {
        let runner = Box::new(SystemPing::new(config.ping_command.clone()));
        let notifier = Box::new(SmtpNotifier::from_config(&config));
        Self {
            config,
            targets,
            runner,
            notifier,
            logger,
        }
    }

    #[must_use]
    pub fn with_runner(mut self, runner: Box<dyn ProbeRunner>) -> Self {
        self.runner = runner;
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Run exactly one pass. Per-target failures are logged and never abort the pass.
    pub fn run_pass(&self) {
        self.logger.in_scope(|| {
            tracing::debug!(
                "Pass over {} target(s), relay {}",
                self.targets.len(),
                self.config.relay()
            );
            for target in self.targets.iter() {
                self.monitor_target_in_scope(target);
            }
        });
    }

    /// Monitor one target under this monitor's logger.
    pub fn monitor_target(&self, target: &Target) -> TargetOutcome {
        self.logger.in_scope(|| self.monitor_target_in_scope(target))
    }

    fn monitor_target_in_scope(&self, target: &Target) -> TargetOutcome {
        tracing::info!("Begin monitor: {}", target.name);
        match self.check(target) {
            Ok(outcome) => {
                tracing::info!("End monitor: {}", target.name);
                outcome
            }
            Err(error) => {
                tracing::error!("Error: {}: {error}", target.name);
                TargetOutcome::Failed { error }
            }
        }
    }

    fn check(&self, target: &Target) -> Result<TargetOutcome> {
        let result = probe(self.runner.as_ref(), target)?;
        if result.reachable {
            tracing::info!("Ping to {} succeeded", target.name);
            return Ok(TargetOutcome::Reachable {
                message: result.message,
            });
        }

        tracing::info!("Ping to {} failed", target.name);
        let mail = compose_failure_mail(target, Local::now().naive_local());
        let sender = target.sender(&self.config);
        let recipients = target.recipients(&self.config);
        self.notifier
            .notify(sender, recipients, &mail.subject, &mail.body)?;
        tracing::info!("Email sent to {recipients}");

        Ok(TargetOutcome::Notified {
            recipients: recipients.clone(),
        })
    }
}
