//! Tooth chart scenario tests.

use std::collections::BTreeMap;

use dental_plan_core::chart::{compute_tooth_color, ChartSession, ToothStatus};
use dental_plan_core::models::{Service, ServiceStatus, ToothPosition, ToothServiceAssignment};

fn tooth(id: i64) -> ToothPosition {
    ToothPosition::new(id).unwrap()
}

fn service_ids(session: &ChartSession, id: u8) -> Vec<i64> {
    session
        .state()
        .assignment(tooth(id.into()))
        .map(|a| a.services.iter().map(|s| s.id).collect())
        .unwrap_or_default()
}

#[test]
fn test_bulk_assign_to_selection() {
    let mut session = ChartSession::new("plan-1");
    session.toggle_select(14).unwrap();
    session.toggle_select(15).unwrap();

    session
        .assign_to_selection(Service::new(3, "Filling", 8000))
        .unwrap();

    assert_eq!(service_ids(&session, 14), vec![3]);
    assert_eq!(service_ids(&session, 15), vec![3]);
    assert!(session.state().selection_is_empty());
    assert_eq!(session.tooth_color(14).unwrap(), ToothStatus::InTreatment);
}

#[test]
fn test_status_flip_to_treated() {
    let mut assignment = ToothServiceAssignment::new(tooth(26));
    assignment.add_service(Service::new(2, "X-ray", 500));
    assignment.add_service(Service::new(3, "Filling", 8000));
    let mut session = ChartSession::open("plan-1", vec![assignment]);

    let notice = session
        .update_service_status(26, 3, ServiceStatus::Completed)
        .unwrap();
    assert!(notice.is_none());

    let statuses = &session.state().assignment(tooth(26)).unwrap().service_statuses;
    assert_eq!(
        statuses,
        &BTreeMap::from([(2, ServiceStatus::Pending), (3, ServiceStatus::Completed)])
    );
    assert_eq!(session.tooth_color(26).unwrap(), ToothStatus::InTreatment);

    session
        .update_service_status(26, 2, ServiceStatus::Completed)
        .unwrap();
    assert_eq!(session.tooth_color(26).unwrap(), ToothStatus::Treated);
}

#[test]
fn test_selected_treated_tooth_stays_treated() {
    let mut session = ChartSession::new("plan-1");
    session
        .assign_service(Service::new(1, "Cleaning", 1000), &[31])
        .unwrap();
    session
        .update_service_status(31, 1, ServiceStatus::Completed)
        .unwrap();
    session.toggle_select(31).unwrap();

    assert!(session.state().is_selected(tooth(31)));
    assert_eq!(
        compute_tooth_color(session.state(), 31).unwrap(),
        ToothStatus::Treated
    );
}

#[test]
fn test_color_recomputed_after_each_mutation() {
    let mut session = ChartSession::new("plan-1");
    assert_eq!(session.tooth_color(44).unwrap(), ToothStatus::Normal);

    session.toggle_select(44).unwrap();
    assert_eq!(session.tooth_color(44).unwrap(), ToothStatus::Selected);

    session
        .assign_to_selection(Service::new(7, "Extraction", 5000))
        .unwrap();
    assert_eq!(session.tooth_color(44).unwrap(), ToothStatus::InTreatment);

    session.remove_service(44, 7).unwrap();
    assert_eq!(session.tooth_color(44).unwrap(), ToothStatus::Normal);
    assert!(!session.state().has_services(tooth(44)));
}

#[test]
fn test_selected_tooth_with_services_receives_more() {
    let mut session = ChartSession::new("plan-1");
    session
        .assign_service(Service::new(2, "X-ray", 500), &[36])
        .unwrap();

    session.toggle_select(36).unwrap();
    session.toggle_select(37).unwrap();
    session
        .assign_to_selection(Service::new(3, "Filling", 8000))
        .unwrap();

    assert_eq!(service_ids(&session, 36), vec![2, 3]);
    assert_eq!(service_ids(&session, 37), vec![3]);
}

#[test]
fn test_summary_follows_chart() {
    let mut session = ChartSession::new("plan-1");
    session
        .assign_service(Service::new(3, "Filling", 8000), &[14, 15])
        .unwrap();
    session
        .update_service_status(14, 3, ServiceStatus::Completed)
        .unwrap();

    let summary = session.summary();
    assert_eq!(summary.teeth_treated, 1);
    assert_eq!(summary.teeth_in_treatment, 1);
    assert_eq!(summary.total_cost, 16000);
    assert_eq!(summary.completed_cost, 8000);
}
