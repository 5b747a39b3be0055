//! The poll, notify, sleep loop.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::message::NotificationEvent;
use crate::notifier::Notify;
use crate::poller::MailSource;

/// What one cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Mailboxes opened and searched.
    pub mailboxes: usize,
    /// Unseen messages found.
    pub messages: usize,
    /// Notifications the daemon accepted.
    pub delivered: usize,
    /// Notifications that could not be delivered.
    pub failed: usize,
}

/// Drives a mail source and a notifier.
#[derive(Debug)]
pub struct Checker<M, N> {
    source: M,
    notifier: N,
    period: Option<Duration>,
}

impl<M, N> Checker<M, N>
where
    M: MailSource,
    N: Notify,
{
    /// Creates a checker. With `period` set to `None` it checks once.
    #[must_use]
    pub const fn new(source: M, notifier: N, period: Option<Duration>) -> Self {
        Self {
            source,
            notifier,
            period,
        }
    }

    /// Polls once and sends a notification per unseen message.
    ///
    /// Notification failures are logged and counted, never returned.
    ///
    /// # Errors
    ///
    /// Returns the poll error if the mail source fails.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        let outcome = self.source.poll().await?;
        let mut report = CycleReport {
            mailboxes: outcome.mailboxes,
            messages: outcome.messages.len(),
            ..CycleReport::default()
        };

        if outcome.messages.is_empty() {
            return Ok(report);
        }

        if let Err(err) = self.notifier.register().await {
            warn!(error = %err, skipped = report.messages, "notifier registration failed");
            report.failed = report.messages;
            return Ok(report);
        }

        for message in &outcome.messages {
            let event = NotificationEvent::from(message);
            match self.notifier.notify(&event).await {
                Ok(()) => {
                    report.delivered += 1;
                    debug!(mailbox = %message.mailbox, uid = %message.uid, "notified");
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        mailbox = %message.mailbox,
                        uid = %message.uid,
                        error = %err,
                        "notification failed"
                    );
                }
            }
        }

        Ok(report)
    }

    /// Runs cycles until the process is stopped, or once without a period.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AuthenticationFailed`] if the very first login is
    /// refused. In single-check mode any cycle error is returned. Later
    /// failures are logged and retried on the next cycle.
    pub async fn run(&mut self) -> Result<()> {
        let mut first = true;
        loop {
            match self.run_cycle().await {
                Ok(report) => info!(
                    mailboxes = report.mailboxes,
                    messages = report.messages,
                    delivered = report.delivered,
                    failed = report.failed,
                    "check complete"
                ),
                Err(err @ Error::AuthenticationFailed(_)) if first => return Err(err),
                Err(err) if self.period.is_none() => return Err(err),
                Err(err) => warn!(error = %err, "check failed, retrying next cycle"),
            }
            first = false;

            let Some(period) = self.period else {
                return Ok(());
            };
            debug!(?period, "sleeping");
            tokio::time::sleep(period).await;
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::message::MessageSummary;
    use crate::poller::PollOutcome;
    use mailbell_imap::Uid;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Default)]
    struct ScriptedSource {
        polls: Rc<Cell<usize>>,
        script: VecDeque<Result<PollOutcome>>,
    }

    impl MailSource for ScriptedSource {
        async fn poll(&mut self) -> Result<PollOutcome> {
            self.polls.set(self.polls.get() + 1);
            self.script
                .pop_front()
                .unwrap_or_else(|| Ok(PollOutcome::default()))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        registrations: Rc<Cell<usize>>,
        sent: Rc<RefCell<Vec<NotificationEvent>>>,
        fail_register: bool,
        fail_notify: bool,
    }

    impl Notify for RecordingNotifier {
        async fn register(&mut self) -> Result<()> {
            self.registrations.set(self.registrations.get() + 1);
            if self.fail_register {
                return Err(Error::ConnectionFailed("daemon down".into()));
            }
            Ok(())
        }

        async fn notify(&mut self, event: &NotificationEvent) -> Result<()> {
            if self.fail_notify {
                return Err(Error::ConnectionFailed("daemon down".into()));
            }
            self.sent.borrow_mut().push(event.clone());
            Ok(())
        }
    }

    fn message(uid: u32, from: &str, subject: &str) -> MessageSummary {
        MessageSummary {
            uid: Uid::new(uid).unwrap(),
            mailbox: "INBOX".into(),
            from: Some(from.into()),
            subject: Some(subject.into()),
        }
    }

    fn outcome(messages: Vec<MessageSummary>) -> Result<PollOutcome> {
        Ok(PollOutcome {
            mailboxes: 1,
            messages,
        })
    }

    #[tokio::test]
    async fn test_no_unseen_sends_nothing() {
        let source = ScriptedSource {
            script: VecDeque::from([outcome(vec![])]),
            ..ScriptedSource::default()
        };
        let notifier = RecordingNotifier::default();
        let registrations = notifier.registrations.clone();
        let sent = notifier.sent.clone();

        let mut checker = Checker::new(source, notifier, None);
        let report = checker.run_cycle().await.unwrap();

        assert_eq!(
            report,
            CycleReport {
                mailboxes: 1,
                ..CycleReport::default()
            }
        );
        assert_eq!(registrations.get(), 0);
        assert!(sent.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_two_unseen_send_two() {
        let source = ScriptedSource {
            script: VecDeque::from([outcome(vec![
                message(1, "Alice", "Lunch?"),
                message(2, "Bob", "Re: Lunch?"),
            ])]),
            ..ScriptedSource::default()
        };
        let notifier = RecordingNotifier::default();
        let registrations = notifier.registrations.clone();
        let sent = notifier.sent.clone();

        let mut checker = Checker::new(source, notifier, None);
        let report = checker.run_cycle().await.unwrap();

        assert_eq!(report.messages, 2);
        assert_eq!(report.delivered, 2);
        assert_eq!(registrations.get(), 1);
        assert_eq!(
            *sent.borrow(),
            vec![
                NotificationEvent {
                    title: "Alice".into(),
                    body: "Lunch?".into(),
                },
                NotificationEvent {
                    title: "Bob".into(),
                    body: "Re: Lunch?".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_registration_skips_batch() {
        let source = ScriptedSource {
            script: VecDeque::from([outcome(vec![message(1, "Alice", "Lunch?")])]),
            ..ScriptedSource::default()
        };
        let notifier = RecordingNotifier {
            fail_register: true,
            ..RecordingNotifier::default()
        };
        let sent = notifier.sent.clone();

        let mut checker = Checker::new(source, notifier, None);
        let report = checker.run_cycle().await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.delivered, 0);
        assert!(sent.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_failed_notification_does_not_fail_cycle() {
        let source = ScriptedSource {
            script: VecDeque::from([outcome(vec![message(1, "Alice", "Lunch?")])]),
            ..ScriptedSource::default()
        };
        let notifier = RecordingNotifier {
            fail_notify: true,
            ..RecordingNotifier::default()
        };

        let mut checker = Checker::new(source, notifier, None);
        let report = checker.run_cycle().await.unwrap();
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_single_check_runs_once() {
        let source = ScriptedSource::default();
        let polls = source.polls.clone();

        let mut checker = Checker::new(source, RecordingNotifier::default(), None);
        checker.run().await.unwrap();
        assert_eq!(polls.get(), 1);
    }

    #[tokio::test]
    async fn test_first_cycle_auth_failure_is_fatal() {
        let source = ScriptedSource {
            script: VecDeque::from([Err(Error::AuthenticationFailed("bad password".into()))]),
            ..ScriptedSource::default()
        };
        let polls = source.polls.clone();

        let mut checker = Checker::new(
            source,
            RecordingNotifier::default(),
            Some(Duration::from_secs(300)),
        );
        let err = checker.run().await.unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed(_)));
        assert_eq!(polls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_cycle_runs_after_period() {
        let period = Duration::from_secs(300);
        let checker = |polls: &Rc<Cell<usize>>| {
            let source = ScriptedSource {
                polls: polls.clone(),
                script: VecDeque::from([outcome(vec![message(1, "Alice", "Lunch?")])]),
            };
            let notifier = RecordingNotifier {
                fail_notify: true,
                ..RecordingNotifier::default()
            };
            Checker::new(source, notifier, Some(period))
        };

        let polls = Rc::new(Cell::new(0));
        let mut early = checker(&polls);
        let run = tokio::time::timeout(period - Duration::from_secs(1), early.run()).await;
        assert!(run.is_err());
        assert_eq!(polls.get(), 1);

        let polls = Rc::new(Cell::new(0));
        let mut late = checker(&polls);
        let run = tokio::time::timeout(period + Duration::from_secs(1), late.run()).await;
        assert!(run.is_err());
        assert_eq!(polls.get(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_later_failures_are_retried() {
        let source = ScriptedSource {
            script: VecDeque::from([
                outcome(vec![]),
                Err(Error::AuthenticationFailed("password changed".into())),
                Err(Error::ConnectionFailed("network down".into())),
                outcome(vec![]),
            ]),
            ..ScriptedSource::default()
        };
        let polls = source.polls.clone();

        let mut checker = Checker::new(
            source,
            RecordingNotifier::default(),
            Some(Duration::from_secs(60)),
        );
        let run = tokio::time::timeout(Duration::from_secs(60 * 3 + 30), checker.run()).await;
        assert!(run.is_err());
        assert_eq!(polls.get(), 4);
    }
}
