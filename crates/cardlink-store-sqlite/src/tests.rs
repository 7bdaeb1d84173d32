//! Integration tests for `SqliteStore` against an in-memory database.

use cardlink_core::{
  Classify as _, ErrorKind,
  actor::{Actor, ActorSources},
  contact::{Address, Category, ContactDetails, ContactFields, Experience, Gender},
  event::{ContactStatus, EventFlags, EventOperation, EventPayload, MatchKey, ReconcileOptions},
  history::ModificationType,
  import::CsvRow,
  store::{ContactAndEvents, ContactFilter, ContactUpsert, CrmStore, NewContact},
  task::{NewTask, TaskCompletion, TaskType, TaskUpdate},
  workflow::{DeletionOutcome, NewAssignment, ReviewDecision, Role, VerificationState},
};
use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn jane() -> ContactFields {
  ContactFields {
    name: Some("Jane Doe".into()),
    phone_number: Some("5551234567".into()),
    email_address: Some("jane@x.com".into()),
    category: Some(Category::A),
    ..Default::default()
  }
}

fn techconf() -> EventPayload {
  EventPayload {
    event_name: Some("TechConf".into()),
    event_held_organization: Some("Acme".into()),
    event_role: Some("Speaker".into()),
    event_date: NaiveDate::from_ymd_opt(2024, 5, 1),
    ..Default::default()
  }
}

fn new_contact(fields: ContactFields, events: Vec<EventPayload>, by: Uuid) -> NewContact {
  NewContact {
    fields,
    details: ContactDetails::default(),
    events,
    created_by: Actor::User(by),
  }
}

fn csv(pairs: &[(&str, &str)]) -> CsvRow { pairs.iter().copied().collect() }

// ─── Identity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn resolve_requires_email_or_phone() {
  let s = store().await;
  let err = s.resolve_contact(None, Some("  ".into())).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn resolve_matches_by_email_or_phone() {
  let s = store().await;
  let w = s
    .create_contact(new_contact(jane(), vec![], Uuid::new_v4()))
    .await
    .unwrap();
  let id = w.bundle.contact.contact_id;

  let by_phone = s
    .resolve_contact(None, Some("5551234567".into()))
    .await
    .unwrap();
  assert_eq!(by_phone.map(|c| c.contact_id), Some(id));

  let by_email = s
    .resolve_contact(Some("jane@x.com".into()), Some("000".into()))
    .await
    .unwrap();
  assert_eq!(by_email.map(|c| c.contact_id), Some(id));

  let none = s
    .resolve_contact(Some("other@x.com".into()), None)
    .await
    .unwrap();
  assert!(none.is_none());
}

#[tokio::test]
async fn resolve_reports_split_identity_as_conflict() {
  let s = store().await;
  let by = Uuid::new_v4();
  s.create_contact(new_contact(jane(), vec![], by)).await.unwrap();
  let other = ContactFields {
    name: Some("John Roe".into()),
    phone_number: Some("5559999999".into()),
    email_address: Some("john@x.com".into()),
    ..Default::default()
  };
  s.create_contact(new_contact(other, vec![], by)).await.unwrap();

  let err = s
    .resolve_contact(Some("jane@x.com".into()), Some("5559999999".into()))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn rejected_contacts_do_not_match() {
  let s = store().await;
  let admin = Uuid::new_v4();
  let w = s
    .create_contact(new_contact(jane(), vec![], admin))
    .await
    .unwrap();
  s.delete_verified_contact(Role::Admin, w.bundle.contact.contact_id, Actor::User(admin))
    .await
    .unwrap();

  let found = s
    .resolve_contact(Some("jane@x.com".into()), None)
    .await
    .unwrap();
  assert!(found.is_none());

  // The identity is free again.
  let again = s
    .create_contact(new_contact(jane(), vec![], admin))
    .await
    .unwrap();
  assert!(again.created);
  assert_ne!(again.bundle.contact.contact_id, w.bundle.contact.contact_id);
}

// ─── Scenarios A and B, P1 ───────────────────────────────────────────────────

#[tokio::test]
async fn capture_creates_contact_event_and_audit() {
  let s = store().await;
  let w = s
    .create_contact(new_contact(jane(), vec![techconf()], Uuid::new_v4()))
    .await
    .unwrap();

  assert!(w.created);
  assert_eq!(w.events.len(), 1);
  assert_eq!(w.events[0].operation, EventOperation::Created);
  let event = &w.bundle.events[0];
  assert!(!event.verified);
  assert_eq!(event.contact_status, ContactStatus::Pending);

  let history = s
    .contact_history(w.bundle.contact.contact_id)
    .await
    .unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].modification_type, ModificationType::Create);
}

#[tokio::test]
async fn second_capture_with_same_phone_reuses_contact() {
  let s = store().await;
  let by = Uuid::new_v4();
  let first = s
    .create_contact(new_contact(jane(), vec![techconf()], by))
    .await
    .unwrap();

  let second_fields = ContactFields {
    name: Some("Jane D.".into()),
    phone_number: Some("5551234567".into()),
    email_address: Some("jane.doe@y.com".into()),
    ..Default::default()
  };
  let summit = EventPayload {
    event_name: Some("Summit".into()),
    event_held_organization: Some("Acme".into()),
    ..Default::default()
  };
  let second = s
    .create_contact(new_contact(second_fields, vec![summit], by))
    .await
    .unwrap();

  assert!(!second.created);
  assert_eq!(second.bundle.contact.contact_id, first.bundle.contact.contact_id);
  assert_eq!(second.events[0].operation, EventOperation::Created);
  assert_eq!(second.bundle.events.len(), 2);

  let all = s.list_contacts(ContactFilter::default()).await.unwrap();
  assert_eq!(all.len(), 1);
  // Category was not supplied the second time and survives the merge.
  assert_eq!(all[0].contact.category, Some(Category::A));
}

#[tokio::test]
async fn capture_requires_identity_fields() {
  let s = store().await;
  let fields = ContactFields {
    name: Some("No Phone".into()),
    email_address: Some("np@x.com".into()),
    ..Default::default()
  };
  let err = s
    .create_contact(new_contact(fields, vec![], Uuid::new_v4()))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert!(s.all_history(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn sub_records_are_stored() {
  let s = store().await;
  let mut input = new_contact(jane(), vec![], Uuid::new_v4());
  input.details = ContactDetails {
    address:     Some(Address {
      city: Some("Pune".into()),
      ..Default::default()
    }),
    education:   None,
    experiences: Some(vec![
      Experience {
        job_title: Some("Engineer".into()),
        ..Default::default()
      },
      Experience {
        job_title: Some("Manager".into()),
        ..Default::default()
      },
    ]),
  };
  let w = s.create_contact(input).await.unwrap();

  let bundle = s
    .get_contact(w.bundle.contact.contact_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(bundle.address.unwrap().city.as_deref(), Some("Pune"));
  assert_eq!(bundle.experiences.len(), 2);
  assert_eq!(bundle.experiences[1].job_title.as_deref(), Some("Manager"));
}

// ─── Event reconciler, P2 ────────────────────────────────────────────────────

#[tokio::test]
async fn reconcile_twice_yields_one_event_and_keeps_omitted_fields() {
  let s = store().await;
  let by = Uuid::new_v4();
  let w = s
    .create_contact(new_contact(jane(), vec![], by))
    .await
    .unwrap();
  let cid = w.bundle.contact.contact_id;
  let opts = ReconcileOptions::new(Actor::User(by));

  let first = s.reconcile_event(cid, techconf(), opts).await.unwrap();
  assert_eq!(first.operation, EventOperation::Created);

  let partial = EventPayload {
    event_name: Some("TechConf".into()),
    event_held_organization: Some("Acme".into()),
    event_location: Some("Berlin".into()),
    ..Default::default()
  };
  let second = s.reconcile_event(cid, partial, opts).await.unwrap();
  assert_eq!(second.operation, EventOperation::Updated);
  assert_eq!(second.event.event_id, first.event.event_id);
  assert_eq!(second.event.event_role.as_deref(), Some("Speaker"));
  assert_eq!(second.event.event_date, NaiveDate::from_ymd_opt(2024, 5, 1));
  assert_eq!(second.event.event_location.as_deref(), Some("Berlin"));

  let bundle = s.get_contact(cid).await.unwrap().unwrap();
  assert_eq!(bundle.events.len(), 1);
}

#[tokio::test]
async fn reconcile_is_case_sensitive_and_org_aware() {
  let s = store().await;
  let by = Uuid::new_v4();
  let cid = s
    .create_contact(new_contact(jane(), vec![techconf()], by))
    .await
    .unwrap()
    .bundle
    .contact
    .contact_id;
  let opts = ReconcileOptions::new(Actor::User(by));

  let lower = EventPayload {
    event_name: Some("techconf".into()),
    event_held_organization: Some("Acme".into()),
    ..Default::default()
  };
  let r = s.reconcile_event(cid, lower, opts).await.unwrap();
  assert_eq!(r.operation, EventOperation::Created);

  let other_org = EventPayload {
    event_name: Some("TechConf".into()),
    event_held_organization: None,
    ..Default::default()
  };
  let r = s.reconcile_event(cid, other_org.clone(), opts).await.unwrap();
  assert_eq!(r.operation, EventOperation::Created);

  // Organisation comparison is null-safe: a second org-less payload matches.
  let r = s.reconcile_event(cid, other_org, opts).await.unwrap();
  assert_eq!(r.operation, EventOperation::Updated);

  // Name-only matching ignores the organisation.
  let by_name = ReconcileOptions {
    match_key: MatchKey::Name,
    ..opts
  };
  let r = s
    .reconcile_event(
      cid,
      EventPayload {
        event_name: Some("techconf".into()),
        event_held_organization: Some("Elsewhere".into()),
        ..Default::default()
      },
      by_name,
    )
    .await
    .unwrap();
  assert_eq!(r.operation, EventOperation::Updated);
  assert_eq!(r.event.event_held_organization.as_deref(), Some("Elsewhere"));
}

#[tokio::test]
async fn photo_capture_is_linked_later() {
  let s = store().await;
  let by = Actor::User(Uuid::new_v4());
  let captured = s
    .capture_event(
      EventPayload {
        photo_id: Some("IMG_001".into()),
        event_name: Some("Expo".into()),
        ..Default::default()
      },
      by,
    )
    .await
    .unwrap();
  assert!(captured.is_orphan());

  let w = s
    .create_contact(NewContact {
      fields:     jane(),
      details:    ContactDetails::default(),
      events:     vec![EventPayload {
        photo_id: Some("IMG_001".into()),
        event_name: Some("Expo".into()),
        event_role: Some("Visitor".into()),
        ..Default::default()
      }],
      created_by: by,
    })
    .await
    .unwrap();

  assert_eq!(w.events[0].operation, EventOperation::Linked);
  assert_eq!(w.events[0].event.event_id, captured.event_id);
  assert_eq!(w.events[0].event.contact_id, Some(w.bundle.contact.contact_id));
  assert_eq!(w.events[0].event.event_role.as_deref(), Some("Visitor"));
}

#[tokio::test]
async fn explicit_event_id_must_exist_and_belong() {
  let s = store().await;
  let by = Uuid::new_v4();
  let opts = ReconcileOptions::new(Actor::User(by));
  let a = s
    .create_contact(new_contact(jane(), vec![techconf()], by))
    .await
    .unwrap();
  let other = ContactFields {
    name: Some("John Roe".into()),
    phone_number: Some("5559999999".into()),
    email_address: Some("john@x.com".into()),
    ..Default::default()
  };
  let b = s.create_contact(new_contact(other, vec![], by)).await.unwrap();

  let missing = EventPayload {
    event_id: Some(Uuid::new_v4()),
    ..Default::default()
  };
  let err = s
    .reconcile_event(a.bundle.contact.contact_id, missing, opts)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let foreign = EventPayload {
    event_id: Some(a.bundle.events[0].event_id),
    ..Default::default()
  };
  let err = s
    .reconcile_event(b.bundle.contact.contact_id, foreign, opts)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ─── Assignment workflow, Scenario C, P4 ─────────────────────────────────────

#[tokio::test]
async fn assignee_update_completes_assignment() {
  let s = store().await;
  let (creator, verifier, u2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
  let w = s
    .create_contact(new_contact(jane(), vec![techconf()], creator))
    .await
    .unwrap();
  let cid = w.bundle.contact.contact_id;
  let event_id = w.bundle.events[0].event_id;

  let created = s
    .create_assignments(
      Role::CatA,
      NewAssignment {
        event_ids:   vec![event_id],
        assigned_to: u2,
        assigned_by: verifier,
      },
    )
    .await
    .unwrap();
  let assignment = &created[0];
  assert!(!assignment.completed);

  let outcome = s
    .upsert_contact(ContactUpsert {
      contact_id: Some(cid),
      fields: ContactFields {
        skills: Some("Rust".into()),
        ..jane()
      },
      event: Some(EventPayload {
        event_id: Some(event_id),
        event_location: Some("Lisbon".into()),
        ..Default::default()
      }),
      assignment_id: Some(assignment.assignment_id),
      actor: ActorSources {
        query_user_id: Some(u2),
        ..Default::default()
      },
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(outcome.modification_type, ModificationType::UserUpdate);
  assert!(outcome.audited);
  let event = outcome.event.unwrap().event;
  assert!(!event.verified);
  assert_eq!(event.event_location.as_deref(), Some("Lisbon"));

  let mine = s.assignments_for_user(u2).await.unwrap();
  assert_eq!(mine.len(), 1);
  assert!(mine[0].assignment.completed);
  assert_eq!(mine[0].state, VerificationState::UserUpdated);

  let given = s.assignments_by_user(verifier).await.unwrap();
  assert_eq!(given.len(), 1);

  let history = s.contact_history(cid).await.unwrap();
  assert_eq!(history[0].modification_type, ModificationType::UserUpdate);
  assert_eq!(history[0].modified_by, Actor::User(u2));
  assert!(
    history
      .iter()
      .any(|h| h.modification_type == ModificationType::Assign)
  );
}

#[tokio::test]
async fn verifier_edit_after_assignment_logs_user_verify() {
  let s = store().await;
  let (creator, verifier) = (Uuid::new_v4(), Uuid::new_v4());
  let w = s
    .create_contact(new_contact(jane(), vec![techconf()], creator))
    .await
    .unwrap();
  let event_id = w.bundle.events[0].event_id;
  s.create_assignments(
    Role::Admin,
    NewAssignment {
      event_ids:   vec![event_id],
      assigned_to: Uuid::new_v4(),
      assigned_by: verifier,
    },
  )
  .await
  .unwrap();

  let outcome = s
    .upsert_contact(ContactUpsert {
      fields: jane(),
      event: Some(EventPayload {
        event_id: Some(event_id),
        ..Default::default()
      }),
      flags: EventFlags {
        verified:       Some(true),
        contact_status: Some(ContactStatus::Approved),
      },
      actor: ActorSources {
        session_user_id: Some(verifier),
        ..Default::default()
      },
      ..Default::default()
    })
    .await
    .unwrap();

  assert!(!outcome.created);
  assert_eq!(outcome.modification_type, ModificationType::UserVerify);
  let event = outcome.event.unwrap().event;
  assert!(event.verified);
  assert_eq!(event.contact_status, ContactStatus::Approved);
}

#[tokio::test]
async fn upsert_matching_assigned_event_by_name_logs_update() {
  let s = store().await;
  let creator = Uuid::new_v4();
  let w = s
    .create_contact(new_contact(jane(), vec![techconf()], creator))
    .await
    .unwrap();
  let event_id = w.bundle.events[0].event_id;
  s.create_assignments(
    Role::Admin,
    NewAssignment {
      event_ids:   vec![event_id],
      assigned_to: Uuid::new_v4(),
      assigned_by: Uuid::new_v4(),
    },
  )
  .await
  .unwrap();

  // Same name and organisation, but no event id.
  let outcome = s
    .upsert_contact(ContactUpsert {
      fields: jane(),
      event: Some(techconf()),
      actor: ActorSources {
        session_user_id: Some(creator),
        ..Default::default()
      },
      ..Default::default()
    })
    .await
    .unwrap();

  assert_eq!(outcome.event.unwrap().event.event_id, event_id);
  assert_eq!(outcome.modification_type, ModificationType::Update);
}

#[tokio::test]
async fn plain_upsert_logs_update_and_new_contact_logs_create() {
  let s = store().await;
  let creator = Uuid::new_v4();
  s.create_contact(new_contact(jane(), vec![techconf()], creator))
    .await
    .unwrap();

  let plain = s
    .upsert_contact(ContactUpsert {
      fields: ContactFields {
        email_address: Some("jane@x.com".into()),
        logger: Some("met again".into()),
        ..Default::default()
      },
      event: Some(techconf()),
      actor: ActorSources {
        body_created_by: Some(creator),
        ..Default::default()
      },
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(plain.modification_type, ModificationType::Update);
  assert_eq!(plain.bundle.contact.name, "Jane Doe");
  assert_eq!(plain.bundle.contact.logger.as_deref(), Some("met again"));
  assert_eq!(plain.bundle.events.len(), 1);

  let fresh = s
    .upsert_contact(ContactUpsert {
      fields: ContactFields {
        name: Some("New Person".into()),
        email_address: Some("new@x.com".into()),
        ..Default::default()
      },
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(fresh.created);
  assert_eq!(fresh.modification_type, ModificationType::Create);
  assert_eq!(fresh.bundle.contact.created_by, Some(Actor::System));
}

#[tokio::test]
async fn upsert_with_unknown_ids_is_not_found() {
  let s = store().await;
  let err = s
    .upsert_contact(ContactUpsert {
      contact_id: Some(Uuid::new_v4()),
      fields: jane(),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let err = s
    .upsert_contact(ContactUpsert {
      fields: jane(),
      assignment_id: Some(Uuid::new_v4()),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  // The whole write rolled back, including the contact insert.
  assert!(s.list_contacts(ContactFilter::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn actively_assigned_events_are_not_listed_as_unverified() {
  let s = store().await;
  let by = Uuid::new_v4();
  let w = s
    .create_contact(new_contact(jane(), vec![techconf()], by))
    .await
    .unwrap();
  let event_id = w.bundle.events[0].event_id;

  let before = s.list_unverified(None).await.unwrap();
  assert_eq!(before.len(), 1);
  assert_eq!(before[0].event.event_id, event_id);

  let created = s
    .create_assignments(
      Role::CatB,
      NewAssignment {
        event_ids:   vec![event_id],
        assigned_to: Uuid::new_v4(),
        assigned_by: by,
      },
    )
    .await
    .unwrap();
  assert!(s.list_unverified(None).await.unwrap().is_empty());

  // A second active assignment is refused.
  let err = s
    .create_assignments(
      Role::CatB,
      NewAssignment {
        event_ids:   vec![event_id],
        assigned_to: Uuid::new_v4(),
        assigned_by: by,
      },
    )
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);

  s.revoke_assignment(created[0].assignment_id).await.unwrap();
  assert_eq!(s.list_unverified(None).await.unwrap().len(), 1);
  assert_eq!(s.list_unverified(Some(Category::B)).await.unwrap().len(), 0);

  let err = s
    .revoke_assignment(created[0].assignment_id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn plain_users_cannot_assign() {
  let s = store().await;
  let by = Uuid::new_v4();
  let w = s
    .create_contact(new_contact(jane(), vec![techconf()], by))
    .await
    .unwrap();
  let err = s
    .create_assignments(
      Role::User,
      NewAssignment {
        event_ids:   vec![w.bundle.events[0].event_id],
        assigned_to: by,
        assigned_by: by,
      },
    )
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn review_approves_and_rejects() {
  let s = store().await;
  let by = Uuid::new_v4();
  let w = s
    .create_contact(new_contact(jane(), vec![techconf()], by))
    .await
    .unwrap();
  let event_id = w.bundle.events[0].event_id;
  let actor = Actor::User(by);

  let err = s
    .review_event(Role::User, event_id, ReviewDecision::Approve, actor)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::PermissionDenied);

  let approved = s
    .review_event(Role::CatA, event_id, ReviewDecision::Approve, actor)
    .await
    .unwrap();
  assert!(approved.verified);
  assert_eq!(approved.contact_status, ContactStatus::Approved);

  let rejected = s
    .review_event(Role::Admin, event_id, ReviewDecision::Reject, actor)
    .await
    .unwrap();
  assert!(rejected.verified);
  assert_eq!(rejected.contact_status, ContactStatus::Rejected);
}

// ─── Deletion, Scenario E, P5 ────────────────────────────────────────────────

#[tokio::test]
async fn user_cannot_delete_approved_verified_event() {
  let s = store().await;
  let by = Uuid::new_v4();
  let actor = Actor::User(by);
  let w = s
    .create_contact(new_contact(jane(), vec![techconf()], by))
    .await
    .unwrap();
  let cid = w.bundle.contact.contact_id;
  let event_id = w.bundle.events[0].event_id;
  s.review_event(Role::CatA, event_id, ReviewDecision::Approve, actor)
    .await
    .unwrap();

  let before = s.get_contact(cid).await.unwrap().unwrap();
  let history_before = s.contact_history(cid).await.unwrap().len();

  let err = s
    .delete_contact_event(Role::User, event_id, actor)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::PermissionDenied);

  let after = s.get_contact(cid).await.unwrap().unwrap();
  assert_eq!(after.events, before.events);
  assert_eq!(after.contact, before.contact);
  assert_eq!(s.contact_history(cid).await.unwrap().len(), history_before);
}

#[tokio::test]
async fn user_deletes_pending_event_and_reviewer_soft_rejects() {
  let s = store().await;
  let by = Uuid::new_v4();
  let actor = Actor::User(by);
  let w = s
    .create_contact(new_contact(
      jane(),
      vec![techconf(), EventPayload {
        event_name: Some("Summit".into()),
        ..Default::default()
      }],
      by,
    ))
    .await
    .unwrap();
  let cid = w.bundle.contact.contact_id;
  let (first, second) = (w.bundle.events[0].event_id, w.bundle.events[1].event_id);

  let outcome = s.delete_contact_event(Role::User, first, actor).await.unwrap();
  assert_eq!(outcome, DeletionOutcome::Removed);

  let outcome = s
    .delete_contact_event(Role::CatC, second, actor)
    .await
    .unwrap();
  assert_eq!(outcome, DeletionOutcome::SoftRejected);

  let bundle = s.get_contact(cid).await.unwrap().unwrap();
  assert_eq!(bundle.events.len(), 1);
  assert_eq!(bundle.events[0].contact_status, ContactStatus::Rejected);
  assert!(bundle.events[0].verified);

  // Bounced back: the user may now remove it.
  let outcome = s.delete_contact_event(Role::User, second, actor).await.unwrap();
  assert_eq!(outcome, DeletionOutcome::Removed);

  let deletes = s
    .contact_history(cid)
    .await
    .unwrap()
    .into_iter()
    .filter(|h| h.modification_type == ModificationType::Delete)
    .count();
  assert_eq!(deletes, 3);
}

#[tokio::test]
async fn delete_verified_contact_is_reviewer_only() {
  let s = store().await;
  let by = Uuid::new_v4();
  let w = s
    .create_contact(new_contact(jane(), vec![], by))
    .await
    .unwrap();
  let cid = w.bundle.contact.contact_id;

  let err = s
    .delete_verified_contact(Role::User, cid, Actor::User(by))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::PermissionDenied);

  let err = s
    .delete_verified_contact(Role::Admin, Uuid::new_v4(), Actor::User(by))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let contact = s
    .delete_verified_contact(Role::CatA, cid, Actor::User(by))
    .await
    .unwrap();
  assert!(contact.rejected);
  assert!(s.list_contacts(ContactFilter::default()).await.unwrap().is_empty());
}

// ─── Audit best-effort, P3 ───────────────────────────────────────────────────

#[tokio::test]
async fn audit_failure_does_not_block_business_write() {
  let s = store().await;
  s.execute_batch("DROP TABLE contact_modification_history;")
    .await
    .unwrap();

  let w = s
    .create_contact(new_contact(jane(), vec![techconf()], Uuid::new_v4()))
    .await
    .unwrap();
  assert!(w.created);

  let outcome = s
    .upsert_contact(ContactUpsert {
      fields: ContactFields {
        email_address: Some("jane@x.com".into()),
        skills: Some("Go".into()),
        ..Default::default()
      },
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(!outcome.audited);
  assert_eq!(outcome.bundle.contact.skills.as_deref(), Some("Go"));

  let stored = s
    .get_contact(w.bundle.contact.contact_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored.events.len(), 1);
  assert_eq!(stored.contact.skills.as_deref(), Some("Go"));
}

// ─── Contacts: other operations ──────────────────────────────────────────────

#[tokio::test]
async fn update_contact_and_events_checks_ownership() {
  let s = store().await;
  let by = Uuid::new_v4();
  let a = s
    .create_contact(new_contact(jane(), vec![techconf()], by))
    .await
    .unwrap();
  let cid = a.bundle.contact.contact_id;
  let event_id = a.bundle.events[0].event_id;

  let err = s
    .update_contact_and_events(cid, ContactAndEvents {
      fields: jane(),
      events: vec![],
      actor:  Actor::User(by),
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let err = s
    .update_contact_and_events(cid, ContactAndEvents {
      fields: jane(),
      events: vec![EventPayload {
        event_id: Some(Uuid::new_v4()),
        ..Default::default()
      }],
      actor:  Actor::User(by),
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let bundle = s
    .update_contact_and_events(cid, ContactAndEvents {
      fields: ContactFields {
        nationality: Some("Indian".into()),
        ..jane()
      },
      events: vec![EventPayload {
        event_id: Some(event_id),
        event_role: Some("Panelist".into()),
        ..Default::default()
      }],
      actor:  Actor::User(by),
    })
    .await
    .unwrap();
  assert_eq!(bundle.contact.nationality.as_deref(), Some("Indian"));
  assert_eq!(bundle.events[0].event_role.as_deref(), Some("Panelist"));
  assert_eq!(bundle.events[0].event_held_organization.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn add_event_requires_name_role_date() {
  let s = store().await;
  let by = Actor::User(Uuid::new_v4());
  let cid = s
    .create_contact(NewContact {
      fields:     jane(),
      details:    ContactDetails::default(),
      events:     vec![],
      created_by: by,
    })
    .await
    .unwrap()
    .bundle
    .contact
    .contact_id;

  let err = s
    .add_event_to_contact(
      cid,
      EventPayload {
        event_name: Some("Meetup".into()),
        ..Default::default()
      },
      by,
    )
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let event = s
    .add_event_to_contact(cid, techconf(), by)
    .await
    .unwrap();
  assert_eq!(event.contact_id, Some(cid));
  let history = s.contact_history(cid).await.unwrap();
  assert_eq!(history[0].modification_type, ModificationType::UpdateUserEvent);
}

#[tokio::test]
async fn search_only_returns_contacts_with_verified_events() {
  let s = store().await;
  let by = Uuid::new_v4();
  let w = s
    .create_contact(new_contact(jane(), vec![techconf()], by))
    .await
    .unwrap();
  assert!(s.search_contacts("jane".into()).await.unwrap().is_empty());

  s.review_event(
    Role::Admin,
    w.bundle.events[0].event_id,
    ReviewDecision::Approve,
    Actor::User(by),
  )
  .await
  .unwrap();
  let found = s.search_contacts("JANE".into()).await.unwrap();
  assert_eq!(found.len(), 1);
  assert_eq!(s.search_contacts("5551".into()).await.unwrap().len(), 1);
  assert!(s.search_contacts("%".into()).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_contacts_filters_by_category_and_creator() {
  let s = store().await;
  let (u1, u2) = (Uuid::new_v4(), Uuid::new_v4());
  s.create_contact(new_contact(jane(), vec![techconf()], u1))
    .await
    .unwrap();
  let john = ContactFields {
    name: Some("John Roe".into()),
    phone_number: Some("5559999999".into()),
    email_address: Some("john@x.com".into()),
    category: Some(Category::C),
    ..Default::default()
  };
  s.create_contact(new_contact(john, vec![techconf()], u2))
    .await
    .unwrap();

  let cat_c = s
    .list_contacts(ContactFilter {
      category: Some(Category::C),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(cat_c.len(), 1);
  assert_eq!(cat_c[0].contact.name, "John Roe");

  let mine = s
    .list_contacts(ContactFilter {
      created_by: Some(Actor::User(u1)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0].contact.name, "Jane Doe");
}

// ─── CSV import, Scenario D ──────────────────────────────────────────────────

#[tokio::test]
async fn csv_import_normalises_and_counts() {
  let s = store().await;
  let by = Actor::User(Uuid::new_v4());
  let rows = vec![
    csv(&[
      ("name", "Jane Doe"),
      ("phone", "5551234567"),
      ("email", "jane@x.com"),
      ("gender", "M"),
      ("category", "a"),
      ("event_name", "TechConf"),
    ]),
    csv(&[
      ("name", "John Roe"),
      ("phone_number", "5559999999"),
      ("email_address", "john@x.com"),
      ("gender", "unknown"),
    ]),
    csv(&[("name", "Broken"), ("email", "broken@x.com")]),
    csv(&[
      ("name", "Jane Doe"),
      ("phone", "5551234567"),
      ("email", "jane@x.com"),
      ("event_name", "TechConf"),
      ("event_location", "Paris"),
    ]),
  ];

  let report = s.import_rows(rows, by).await.unwrap();
  assert_eq!(report.total_rows, 4);
  assert_eq!(report.success_count, 3);
  assert_eq!(report.inserted_count, 2);
  assert_eq!(report.updated_count, 1);
  assert_eq!(report.events_created, 1);
  assert_eq!(report.events_updated, 1);
  assert_eq!(report.error_count, 1);
  assert_eq!(report.errors[0].row, 3);

  let jane = s
    .resolve_contact(Some("jane@x.com".into()), None)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(jane.gender, Some(Gender::Male));
  assert_eq!(jane.category, Some(Category::A));
  let john = s
    .resolve_contact(Some("john@x.com".into()), None)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(john.gender, None);

  let bundle = s.get_contact(jane.contact_id).await.unwrap().unwrap();
  assert_eq!(bundle.events.len(), 1);
  assert!(bundle.events[0].verified);
  assert_eq!(bundle.events[0].contact_status, ContactStatus::Approved);
  assert_eq!(bundle.events[0].event_location.as_deref(), Some("Paris"));
}

#[tokio::test]
async fn csv_reimport_keeps_review_state_of_existing_events() {
  let s = store().await;
  let by = Actor::User(Uuid::new_v4());
  let row = |org: &str| {
    csv(&[
      ("name", "Jane Doe"),
      ("phone", "5551234567"),
      ("email", "jane@x.com"),
      ("event_name", "TechConf"),
      ("event_held_organization", org),
    ])
  };

  let first = s.import_rows(vec![row("Acme")], by).await.unwrap();
  assert_eq!(first.events_created, 1);
  let contact_id = first.processed[0].contact_id;
  let event_id = s.get_contact(contact_id).await.unwrap().unwrap().events[0].event_id;

  s.review_event(Role::Admin, event_id, ReviewDecision::Reject, by)
    .await
    .unwrap();

  let again = s.import_rows(vec![row("Globex")], by).await.unwrap();
  assert_eq!(again.events_updated, 1);

  let events = s.get_contact(contact_id).await.unwrap().unwrap().events;
  assert_eq!(events.len(), 1);
  assert_eq!(events[0].contact_status, ContactStatus::Rejected);
  assert!(events[0].verified);
  assert_eq!(events[0].event_held_organization.as_deref(), Some("Globex"));
}

#[tokio::test]
async fn csv_row_conflict_rolls_back_only_that_row() {
  let s = store().await;
  let by = Actor::User(Uuid::new_v4());
  let rows = vec![
    csv(&[("name", "Jane"), ("phone", "111"), ("email", "jane@x.com")]),
    csv(&[("name", "John"), ("phone", "222"), ("email", "john@x.com")]),
    // Email belongs to Jane, phone to John.
    csv(&[("name", "Mix"), ("phone", "222"), ("email", "jane@x.com")]),
    csv(&[("name", "Ann"), ("phone", "333"), ("email", "ann@x.com")]),
  ];
  let report = s.import_rows(rows, by).await.unwrap();
  assert_eq!(report.inserted_count, 3);
  assert_eq!(report.error_count, 1);
  assert_eq!(report.errors[0].row, 3);
  assert_eq!(report.errors[0].email.as_deref(), Some("jane@x.com"));

  let all = s.list_contacts(ContactFilter::default()).await.unwrap();
  assert_eq!(all.len(), 3);
  let jane = all.iter().find(|b| b.contact.name == "Jane").unwrap();
  assert_eq!(jane.contact.phone_number.as_deref(), Some("111"));
}

#[tokio::test]
async fn csv_import_is_audited() {
  let s = store().await;
  let by = Actor::User(Uuid::new_v4());
  let rows = vec![csv(&[
    ("name", "Jane"),
    ("phone", "111"),
    ("email", "jane@x.com"),
  ])];
  s.import_rows(rows.clone(), by).await.unwrap();
  s.import_rows(rows, by).await.unwrap();

  let history = s.all_history(None).await.unwrap();
  let kinds: Vec<_> = history.iter().map(|h| h.modification_type).collect();
  assert_eq!(kinds, [ModificationType::Update, ModificationType::Create]);
  assert_eq!(s.all_history(Some(1)).await.unwrap().len(), 1);
}

// ─── Tasks ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn manual_task_lifecycle() {
  let s = store().await;
  let err = s.create_task(NewTask::default()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let task = s
    .create_task(NewTask {
      task_title: Some("Call back".into()),
      task_deadline: NaiveDate::from_ymd_opt(2024, 6, 1),
      task_assigned_category: Some(Category::B),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(task.task_type, TaskType::Assigned);
  assert!(!task.task_completion);

  let updated = s
    .update_task(task.task_id, TaskUpdate {
      task_description: Some("Ask about the summit".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(updated.task_title, "Call back");
  assert_eq!(updated.task_description.as_deref(), Some("Ask about the summit"));

  let done = s
    .complete_task(task.task_id, TaskCompletion {
      completed:   true,
      modified_by: None,
    })
    .await
    .unwrap();
  assert!(done.task_completion);

  let err = s
    .update_task(task.task_id, TaskUpdate::default())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  let err = s.delete_task(task.task_id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let err = s.delete_task(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert!(s.get_task(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn task_listing_and_stats() {
  let s = store().await;
  for (title, cat) in [("a", Category::A), ("b", Category::A), ("c", Category::B)] {
    s.create_task(NewTask {
      task_title: Some(title.into()),
      task_deadline: NaiveDate::from_ymd_opt(2024, 6, 1),
      task_assigned_category: Some(cat),
      ..Default::default()
    })
    .await
    .unwrap();
  }

  let a = s.list_tasks(Role::CatA, Some(Category::A)).await.unwrap();
  assert_eq!(a.tasks.len(), 2);
  assert_eq!(a.stats.overall.pending, 2);
  assert_eq!(a.stats.assigned.total, 2);

  let all = s.list_tasks(Role::Admin, None).await.unwrap();
  assert_eq!(all.stats.overall.total, 3);

  let err = s.list_tasks(Role::CatA, None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

// ─── Staleness, P6 ───────────────────────────────────────────────────────────

async fn verified_contact(s: &SqliteStore) -> Uuid {
  let by = Uuid::new_v4();
  let w = s
    .create_contact(new_contact(jane(), vec![techconf()], by))
    .await
    .unwrap();
  s.review_event(
    Role::Admin,
    w.bundle.events[0].event_id,
    ReviewDecision::Approve,
    Actor::User(by),
  )
  .await
  .unwrap();
  w.bundle.contact.contact_id
}

#[tokio::test]
async fn scan_ignores_contacts_without_verified_events() {
  let s = store().await;
  s.create_contact(new_contact(jane(), vec![techconf()], Uuid::new_v4()))
    .await
    .unwrap();
  let report = s
    .scan_stale_contacts(Utc::now() + Duration::days(365))
    .await
    .unwrap();
  assert_eq!(report.contacts_checked, 0);
  assert_eq!(report.tasks_created(), 0);
}

#[tokio::test]
async fn scan_is_idempotent() {
  let s = store().await;
  let cid = verified_contact(&s).await;
  let later = Utc::now() + Duration::days(90);

  let first = s.scan_stale_contacts(later).await.unwrap();
  assert_eq!(first.detail_update_created, 1);
  assert_eq!(first.follow_up_created, 1);

  let second = s.scan_stale_contacts(later).await.unwrap();
  assert_eq!(second.tasks_created(), 0);
  assert_eq!(second.duplicates_skipped, 2);

  let tasks = s.list_tasks(Role::Admin, None).await.unwrap();
  assert_eq!(tasks.tasks.len(), 2);
  assert_eq!(tasks.stats.automated.total, 2);
  for task in &tasks.tasks {
    assert_eq!(task.contact_id, Some(cid));
    assert_eq!(task.task_type, TaskType::Automated);
    assert_eq!(task.task_assigned_category, Some(Category::A));
  }
  let follow_up = tasks
    .tasks
    .iter()
    .find(|t| t.task_title == "Contact Follow-up Required")
    .unwrap();
  assert_eq!(follow_up.task_deadline, (later + Duration::days(7)).date_naive());
  assert!(
    follow_up
      .task_description
      .as_deref()
      .unwrap()
      .contains("Total previous contacts: 0")
  );
}

#[tokio::test]
async fn completed_follow_up_resets_clock_and_is_counted() {
  let s = store().await;
  let cid = verified_contact(&s).await;
  let in_40_days = Utc::now() + Duration::days(40);

  let report = s.scan_stale_contacts(in_40_days).await.unwrap();
  assert_eq!(report.follow_up_created, 1);
  assert_eq!(report.detail_update_created, 0);

  let task = s
    .list_tasks(Role::Admin, None)
    .await
    .unwrap()
    .tasks
    .into_iter()
    .next()
    .unwrap();
  s.complete_task(task.task_id, TaskCompletion {
    completed:   true,
    modified_by: Some(Actor::User(Uuid::new_v4())),
  })
  .await
  .unwrap();

  let history = s.contact_history(cid).await.unwrap();
  assert_eq!(history[0].modification_type, ModificationType::Contact);

  // The CONTACT record starts a new thirty-day window.
  let report = s
    .scan_stale_contacts(Utc::now() + Duration::days(20))
    .await
    .unwrap();
  assert_eq!(report.tasks_created(), 0);

  // Completed tasks do not suppress a new one once the window lapses.
  let report = s.scan_stale_contacts(in_40_days).await.unwrap();
  assert_eq!(report.follow_up_created, 1);
  assert_eq!(report.duplicates_skipped, 0);

  let open = s
    .list_tasks(Role::Admin, None)
    .await
    .unwrap()
    .tasks
    .into_iter()
    .find(|t| !t.task_completion)
    .unwrap();
  assert!(
    open
      .task_description
      .as_deref()
      .unwrap()
      .contains("Total previous contacts: 1")
  );
}

#[tokio::test]
async fn fresh_contacts_are_not_stale() {
  let s = store().await;
  verified_contact(&s).await;
  let report = s.scan_stale_contacts(Utc::now()).await.unwrap();
  assert_eq!(report.contacts_checked, 1);
  assert_eq!(report.tasks_created(), 0);
}
