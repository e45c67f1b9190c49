//! Check-in creation from recognition output.

use chrono::{DateTime, Utc};
use log::debug;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use super::model::{CheckInSession, NewCheckInSession, RecognitionMatch};
use super::store::CheckInStore;
use crate::constants::RECOGNITION_CONFIDENCE_THRESHOLD;
use crate::employees::EmployeeRepositoryTrait;
use crate::errors::{Error, Result};
use crate::notifications::{CheckInNotice, NotificationHub};

/// Acceptance policy for identity-resolver output.
#[derive(Debug, Clone)]
pub struct RecognitionSettings {
    pub confidence_threshold: f64,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: RECOGNITION_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Photo and geo context captured alongside the recognition result.
#[derive(Debug, Clone)]
pub struct CheckInCapture {
    pub captured_at: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_ref: Option<String>,
    pub metadata: Option<Value>,
}

/// Creates check-in sessions from accepted recognition matches and notifies
/// the day's viewers.
pub struct CheckInService<C, E>
where
    C: CheckInStore,
    E: EmployeeRepositoryTrait,
{
    store: Arc<C>,
    employees: Arc<E>,
    hub: Arc<NotificationHub<C>>,
    settings: RecognitionSettings,
}

impl<C, E> CheckInService<C, E>
where
    C: CheckInStore + 'static,
    E: EmployeeRepositoryTrait + 'static,
{
    pub fn new(
        store: Arc<C>,
        employees: Arc<E>,
        hub: Arc<NotificationHub<C>>,
        settings: RecognitionSettings,
    ) -> Self {
        Self {
            store,
            employees,
            hub,
            settings,
        }
    }

    /// Accept the strongest recognition match at or above the confidence
    /// threshold, persist the session, and publish it to the day's topic.
    ///
    /// Fan-out is an explicit step of the write path here, not a hidden
    /// storage hook, so it can be observed and tested like any other call.
    pub async fn record_check_in(
        &self,
        matches: &[RecognitionMatch],
        capture: CheckInCapture,
    ) -> Result<CheckInSession> {
        let accepted = matches
            .iter()
            .filter(|candidate| candidate.confidence >= self.settings.confidence_threshold)
            .max_by(|a, b| {
                a.confidence
                    .partial_cmp(&b.confidence)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .ok_or(Error::RecognitionRejected)?;

        let employee = self
            .employees
            .get_by_id(&accepted.employee_id)?
            .ok_or_else(|| Error::EmployeeNotFound(accepted.employee_id.clone()))?;

        debug!(
            "check-in accepted for {} at confidence {:.3}",
            employee.id, accepted.confidence
        );

        let session = self
            .store
            .insert(NewCheckInSession {
                id: Uuid::new_v4().to_string(),
                employee_id: employee.id.clone(),
                started_at: capture.captured_at,
                latitude: capture.latitude,
                longitude: capture.longitude,
                photo_ref: capture.photo_ref,
                metadata: capture.metadata,
            })
            .await?;

        self.hub.publish(CheckInNotice {
            session_id: session.id.clone(),
            employee_id: employee.id,
            employee_name: employee.display_name,
            department: employee.department,
            photo_ref: session.photo_ref.clone(),
            started_at: session.started_at,
        });

        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkins::SessionClosure;
    use crate::employees::Employee;
    use crate::notifications::HubSettings;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use rollcall_access_events::Pin;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        sessions: Mutex<Vec<CheckInSession>>,
    }

    #[async_trait]
    impl CheckInStore for MemoryStore {
        async fn insert(&self, new: NewCheckInSession) -> Result<CheckInSession> {
            let session = CheckInSession {
                id: new.id,
                employee_id: new.employee_id,
                started_at: new.started_at,
                ended_at: None,
                latitude: new.latitude,
                longitude: new.longitude,
                photo_ref: new.photo_ref,
                metadata: new.metadata,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            };
            self.sessions.lock().unwrap().push(session.clone());
            Ok(session)
        }

        fn list_for_day(&self, day: NaiveDate) -> Result<Vec<CheckInSession>> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.day() == day)
                .cloned()
                .collect())
        }

        fn list_stale_open(&self, _cutoff: DateTime<Utc>) -> Result<Vec<CheckInSession>> {
            Ok(Vec::new())
        }

        async fn close_batch(&self, _closures: Vec<SessionClosure>) -> Result<usize> {
            Ok(0)
        }
    }

    struct FixedEmployees(Vec<Employee>);

    impl EmployeeRepositoryTrait for FixedEmployees {
        fn list_active(&self) -> Result<Vec<Employee>> {
            Ok(self.0.clone())
        }

        fn get_by_id(&self, id: &str) -> Result<Option<Employee>> {
            Ok(self.0.iter().find(|e| e.id == id).cloned())
        }

        fn get_by_pin(&self, pin: &Pin) -> Result<Option<Employee>> {
            Ok(self.0.iter().find(|e| e.pin == *pin).cloned())
        }
    }

    fn employee(id: &str, name: &str, department: Option<&str>) -> Employee {
        Employee {
            id: id.to_string(),
            pin: Pin::new("10042"),
            display_name: name.to_string(),
            department: department.map(str::to_string),
            is_active: true,
        }
    }

    fn capture() -> CheckInCapture {
        CheckInCapture {
            captured_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
            latitude: Some(48.2082),
            longitude: Some(16.3738),
            photo_ref: Some("photos/abc123.jpg".to_string()),
            metadata: None,
        }
    }

    fn service(
        store: Arc<MemoryStore>,
        employees: Vec<Employee>,
    ) -> (
        CheckInService<MemoryStore, FixedEmployees>,
        Arc<NotificationHub<MemoryStore>>,
    ) {
        let hub = Arc::new(NotificationHub::new(store.clone(), HubSettings::default()));
        let service = CheckInService::new(
            store,
            Arc::new(FixedEmployees(employees)),
            hub.clone(),
            RecognitionSettings::default(),
        );
        (service, hub)
    }

    #[tokio::test]
    async fn test_accepts_strongest_match_above_threshold() {
        let store = Arc::new(MemoryStore::default());
        let (service, _hub) = service(
            store.clone(),
            vec![
                employee("e1", "Dana Ruiz", Some("Mathematics")),
                employee("e2", "Kim Osei", None),
            ],
        );

        let matches = vec![
            RecognitionMatch {
                employee_id: "e2".to_string(),
                confidence: 0.81,
            },
            RecognitionMatch {
                employee_id: "e1".to_string(),
                confidence: 0.97,
            },
        ];
        let session = service.record_check_in(&matches, capture()).await.unwrap();

        assert_eq!(session.employee_id, "e1");
        assert!(session.is_open());
        assert_eq!(store.sessions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejects_when_no_match_clears_threshold() {
        let store = Arc::new(MemoryStore::default());
        let (service, _hub) = service(store.clone(), vec![employee("e1", "Dana Ruiz", None)]);

        let matches = vec![RecognitionMatch {
            employee_id: "e1".to_string(),
            confidence: 0.42,
        }];
        let err = service.record_check_in(&matches, capture()).await.unwrap_err();

        assert!(matches!(err, Error::RecognitionRejected));
        assert!(store.sessions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_empty_match_list() {
        let store = Arc::new(MemoryStore::default());
        let (service, _hub) = service(store, vec![employee("e1", "Dana Ruiz", None)]);

        let err = service.record_check_in(&[], capture()).await.unwrap_err();
        assert!(matches!(err, Error::RecognitionRejected));
    }

    #[tokio::test]
    async fn test_unknown_employee_is_an_error() {
        let store = Arc::new(MemoryStore::default());
        let (service, _hub) = service(store, vec![]);

        let matches = vec![RecognitionMatch {
            employee_id: "ghost".to_string(),
            confidence: 0.99,
        }];
        let err = service.record_check_in(&matches, capture()).await.unwrap_err();

        assert!(matches!(err, Error::EmployeeNotFound(_)));
    }

    #[tokio::test]
    async fn test_creation_notifies_day_subscribers() {
        let store = Arc::new(MemoryStore::default());
        let (service, hub) = service(
            store,
            vec![employee("e1", "Dana Ruiz", Some("Mathematics"))],
        );

        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let (_, mut sub) = hub.subscribe(day).unwrap();

        let matches = vec![RecognitionMatch {
            employee_id: "e1".to_string(),
            confidence: 0.97,
        }];
        let session = service.record_check_in(&matches, capture()).await.unwrap();

        let notice = sub.try_recv().expect("subscriber should see the check-in");
        assert_eq!(notice.session_id, session.id);
        assert_eq!(notice.employee_name, "Dana Ruiz");
        assert_eq!(notice.department.as_deref(), Some("Mathematics"));
        assert_eq!(notice.photo_ref.as_deref(), Some("photos/abc123.jpg"));
    }
}
