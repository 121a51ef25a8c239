use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use application_workflow::workflows::applications::{
    plan_transition, Application, ApplicationDraft, ApplicationService, ApplicationStatus,
    InMemoryApplicationStore, LifecycleError, RevisionType, TRANSITION_TABLE,
};

fn service() -> ApplicationService<InMemoryApplicationStore> {
    ApplicationService::new(Arc::new(InMemoryApplicationStore::new()))
}

fn accepted(service: &ApplicationService<InMemoryApplicationStore>) -> Application {
    let created = service
        .create(ApplicationDraft::new("new app", "Something"))
        .expect("create");
    service.verify(created.id).expect("verify");
    service.accept(created.id).expect("accept")
}

#[test]
fn transition_table_is_exhaustive() {
    for from in ApplicationStatus::ordered() {
        for to in ApplicationStatus::ordered() {
            let listed = TRANSITION_TABLE
                .iter()
                .any(|rule| rule.from == from && rule.to == to);
            let outcome = plan_transition(from, to, Some("reason"));
            assert_eq!(
                outcome.is_ok(),
                listed,
                "{from} -> {to} disagrees with the table"
            );
            if !listed {
                assert!(matches!(
                    outcome,
                    Err(LifecycleError::InvalidTransition { .. })
                ));
            }
        }
    }
}

#[test]
fn full_lifecycle_leaves_matching_audit_trail() {
    let service = service();
    let created = service
        .create(ApplicationDraft::new("new app", "Something"))
        .expect("create");
    assert_eq!(created.status, ApplicationStatus::Created);
    assert_eq!(service.audit(created.id).expect("audit").len(), 1);

    let verified = service.verify(created.id).expect("verify");
    let error = service.publish(created.id).expect_err("publish from verified");
    assert!(error.to_string().contains("only accept or reject"));

    let accepted = service.accept(created.id).expect("accept");
    let published = service.publish(created.id).expect("publish");
    assert!(published.application_number.is_some());

    let audit = service.audit(created.id).expect("audit");
    let snapshots: Vec<_> = audit.iter().map(|r| r.application.clone()).collect();
    assert_eq!(snapshots, vec![created, verified, accepted, published]);
    assert_eq!(audit[0].revision_type, RevisionType::Insert);
    assert!(audit
        .windows(2)
        .all(|pair| pair[0].revision_number <= pair[1].revision_number));
}

#[test]
fn rejected_application_is_frozen() {
    let service = service();
    let created = service
        .create(ApplicationDraft::new("new app", "Something"))
        .expect("create");
    service.verify(created.id).expect("verify");

    assert!(matches!(
        service.reject(created.id, None),
        Err(LifecycleError::MissingReason)
    ));
    let rejected = service
        .reject(created.id, Some("bad".to_string()))
        .expect("reject");
    assert_eq!(rejected.reason.as_deref(), Some("bad"));
    assert!(rejected.application_number.is_none());

    for target in ApplicationStatus::ordered() {
        assert!(matches!(
            service.transition(created.id, target, Some("more".to_string())),
            Err(LifecycleError::InvalidTransition { .. })
        ));
    }
}

#[test]
fn deleted_application_survives_only_in_audit() {
    let service = service();
    let created = service
        .create(ApplicationDraft::new("new app", "Something"))
        .expect("create");
    service
        .delete(created.id, Some("no longer needed".to_string()))
        .expect("delete");

    assert!(matches!(
        service.get(created.id),
        Err(LifecycleError::NotFound(_))
    ));
    let audit = service.audit(created.id).expect("audit");
    let last = audit.last().expect("final revision");
    assert_eq!(last.revision_type, RevisionType::Delete);
    assert_eq!(last.application.status, ApplicationStatus::Deleted);
    assert_eq!(last.application.reason.as_deref(), Some("no longer needed"));

    let verified = service
        .create(ApplicationDraft::new("new app", "Something"))
        .expect("create");
    service.verify(verified.id).expect("verify");
    assert!(matches!(
        service.delete(verified.id, Some("someReason".to_string())),
        Err(LifecycleError::InvalidTransition { .. })
    ));
}

#[test]
fn name_filter_pages_results() {
    let service = service();
    for index in 0..100 {
        let name = if index % 2 == 0 { "new app" } else { "anotherName" };
        service
            .create(ApplicationDraft::new(name, "body"))
            .expect("create");
    }

    let page = service
        .list(Some("anoth".to_string()), None, 0, Some(10))
        .expect("list");
    assert_eq!(page.total_items, 50);
    assert_eq!(page.total_pages, 5);
    assert_eq!(page.items.len(), 10);

    let last = service
        .list(Some("anoth".to_string()), None, 4, Some(10))
        .expect("list");
    assert_eq!(last.items.len(), 10);
    let beyond = service
        .list(Some("anoth".to_string()), None, 5, Some(10))
        .expect("list");
    assert!(beyond.items.is_empty());
}

#[test]
fn racing_publish_and_reject_settle_on_one_outcome() {
    for _ in 0..20 {
        let service = Arc::new(service());
        let application = accepted(&service);

        let (published, rejected) = thread::scope(|scope| {
            let publisher = scope.spawn(|| service.publish(application.id));
            let rejecter = scope.spawn(|| service.reject(application.id, Some("late".to_string())));
            (
                publisher.join().expect("publisher thread"),
                rejecter.join().expect("rejecter thread"),
            )
        });

        assert!(
            published.is_ok() != rejected.is_ok(),
            "exactly one transition must win"
        );
        let current = service.get(application.id).expect("get");
        assert!(current.is_consistent());
        assert_eq!(service.audit(application.id).expect("audit").len(), 4);
    }
}

#[test]
fn concurrent_publishes_receive_distinct_numbers() {
    let service = Arc::new(service());
    let ids: Vec<_> = (0..32).map(|_| accepted(&service).id).collect();

    let numbers: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let service = &service;
                scope.spawn(move || service.publish(*id).expect("publish"))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("publish thread"))
            .filter_map(|published| published.application_number)
            .collect()
    });

    assert_eq!(numbers.len(), ids.len());
    let distinct: HashSet<_> = numbers.iter().collect();
    assert_eq!(distinct.len(), numbers.len());
}
