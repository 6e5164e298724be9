//! Reports over a seeded database.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use hospital_admin_core::reports::{MetricValue, APPOINTMENT_METRICS, REVENUE_METRICS};
use hospital_admin_core::{
    AppConfig, Appointment, AppointmentStatus, DateRange, Doctor, Gender, HospitalCore,
    HospitalError, InvoiceDraft, LabOrder, LabTest, LineItemInput, Patient, PaymentMethod,
    Prescription, ReportFilter, ReportKind,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
}

fn april() -> DateRange {
    DateRange::new(day(1), day(30)).unwrap()
}

struct Seeded {
    core: HospitalCore,
    cardiologist: Doctor,
}

fn seed() -> Seeded {
    let core = HospitalCore::open_in_memory(AppConfig::default()).unwrap();

    let ana = core
        .register_patient(Patient::new("Ana Lima".into(), Gender::Female), "seed")
        .unwrap();
    let ben = core
        .register_patient(Patient::new("Ben Osei".into(), Gender::Male), "seed")
        .unwrap();

    let cardiologist = core
        .add_doctor(Doctor::new("Dr. Heart".into(), "Cardiologist".into(), "Cardiology".into()), "seed")
        .unwrap();
    let gp = core
        .add_doctor(Doctor::new("Dr. General".into(), "Physician".into(), "General Medicine".into()), "seed")
        .unwrap();

    let book = |patient: &Patient, doctor: &Doctor, d: u32, time: &str| {
        core.book_appointment(
            Appointment::new(patient.id.clone(), doctor.id.clone(), day(d), time.into()),
            "seed",
        )
        .unwrap()
    };
    let a1 = book(&ana, &cardiologist, 3, "09:00");
    let a2 = book(&ben, &cardiologist, 3, "09:30");
    book(&ana, &gp, 10, "10:00");
    let a4 = book(&ben, &gp, 12, "10:00");
    book(&ana, &gp, 30, "15:00");
    // Outside the reporting window
    core.book_appointment(
        Appointment::new(
            ana.id.clone(),
            gp.id.clone(),
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            "10:00".into(),
        ),
        "seed",
    )
    .unwrap();

    core.set_appointment_status(&a1.id, AppointmentStatus::Completed, "seed").unwrap();
    core.set_appointment_status(&a2.id, AppointmentStatus::Cancelled, "seed").unwrap();
    core.set_appointment_status(&a4.id, AppointmentStatus::NoShow, "seed").unwrap();

    for (patient, doctor, medicine, qty) in [
        (&ana, &cardiologist, "Atorvastatin", 30),
        (&ben, &cardiologist, "atorvastatin ", 60),
        (&ben, &gp, "Paracetamol", 10),
    ] {
        core.prescribe(
            Prescription::new(patient.id.clone(), doctor.id.clone(), medicine.into(), qty, day(3)),
            "seed",
        )
        .unwrap();
    }

    core.upsert_lab_test(LabTest::new("CBC".into(), "Complete blood count".into(), Decimal::new(1500, 2)), "seed")
        .unwrap();
    let mut cbc = LabOrder::new(ana.id.clone(), "CBC".into(), day(4));
    cbc.doctor_id = Some(cardiologist.id.clone());
    let cbc = core.order_lab_test(cbc, "seed").unwrap();
    core.complete_lab_order(&cbc.id, "within range".into(), "lab").unwrap();
    core.order_lab_test(LabOrder::new(ben.id.clone(), "CBC".into(), day(5)), "seed")
        .unwrap();

    let paid = core
        .create_invoice(
            &InvoiceDraft::new(
                ana.id.clone(),
                vec![LineItemInput::new("Consultation", 1, Decimal::new(10000, 2))],
                day(3),
            ),
            "seed",
        )
        .unwrap();
    core.record_payment(&paid.id, Decimal::new(10000, 2), PaymentMethod::Card, None, "seed")
        .unwrap();
    let partial = core
        .create_invoice(
            &InvoiceDraft::new(
                ben.id.clone(),
                vec![LineItemInput::new("ECG", 1, Decimal::new(4550, 2))],
                day(12),
            ),
            "seed",
        )
        .unwrap();
    core.record_payment(&partial.id, Decimal::new(2000, 2), PaymentMethod::Cash, None, "seed")
        .unwrap();

    Seeded { core, cardiologist }
}

#[test]
fn test_appointment_summary() {
    let s = seed();
    let report = s
        .core
        .build_report(ReportKind::Appointments, april(), &ReportFilter::default())
        .unwrap();

    assert_eq!(report.metric("Total appointments"), Some(MetricValue::Count(5)));
    assert_eq!(report.metric("Scheduled"), Some(MetricValue::Count(2)));
    assert_eq!(report.metric("Completed"), Some(MetricValue::Count(1)));
    assert_eq!(report.metric("Cancelled"), Some(MetricValue::Count(1)));
    assert_eq!(report.metric("No-show"), Some(MetricValue::Count(1)));
}

#[test]
fn test_scalar_csv_has_one_line_per_metric() {
    let s = seed();
    let (file_name, csv) = s
        .core
        .export_report_csv(ReportKind::Revenue, april(), &ReportFilter::default())
        .unwrap();

    assert_eq!(file_name, "revenue_2024-04-01_2024-04-30.csv");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), REVENUE_METRICS.len());
    for (line, label) in lines.iter().zip(REVENUE_METRICS) {
        assert!(line.starts_with(&format!("{},", label)), "{} vs {}", line, label);
    }
    assert_eq!(
        lines,
        vec![
            "Invoices,2",
            "Total billed,145.50",
            "Collected,120.00",
            "Outstanding,25.50",
            "Paid invoices,1",
            "Partially paid invoices,1",
            "Pending invoices,0",
        ]
    );
}

#[test]
fn test_appointment_csv_order() {
    let s = seed();
    let (_, csv) = s
        .core
        .export_report_csv(ReportKind::Appointments, april(), &ReportFilter::default())
        .unwrap();
    let labels: Vec<&str> = csv.lines().map(|l| l.split(',').next().unwrap()).collect();
    assert_eq!(labels, APPOINTMENT_METRICS);
}

#[test]
fn test_doctor_filter() {
    let s = seed();
    let filter = ReportFilter::doctor(s.cardiologist.id.clone());
    let report = s
        .core
        .build_report(ReportKind::Appointments, april(), &filter)
        .unwrap();
    assert_eq!(report.metric("Total appointments"), Some(MetricValue::Count(2)));

    let medicines = s
        .core
        .build_report(ReportKind::Medicines, april(), &filter)
        .unwrap();
    let table = medicines.table().unwrap();
    assert_eq!(table.rows.len(), 1);
    // Spellings differing in case and whitespace merge into one row
    assert_eq!(table.rows[0][0].to_lowercase(), "atorvastatin");
    assert_eq!(table.rows[0][1..], ["2", "90", "2"]);

    // Walk-in orders have no doctor and drop out under a filter
    let lab = s.core.build_report(ReportKind::LabTests, april(), &filter).unwrap();
    assert_eq!(lab.table().unwrap().rows[0][1], "1");
}

#[test]
fn test_department_filter_is_case_insensitive() {
    let s = seed();
    let report = s
        .core
        .build_report(
            ReportKind::Departments,
            april(),
            &ReportFilter::department("general medicine"),
        )
        .unwrap();

    let table = report.table().unwrap();
    assert_eq!(table.rows, vec![vec!["General Medicine", "1", "3", "0", "0"]]);
}

#[test]
fn test_department_table_csv() {
    let s = seed();
    let (_, csv) = s
        .core
        .export_report_csv(ReportKind::Departments, april(), &ReportFilter::default())
        .unwrap();
    assert_eq!(
        csv,
        "Department,Doctors,Appointments,Completed,Cancelled\n\
         General Medicine,1,3,0,0\n\
         Cardiology,1,2,1,1\n"
    );
}

#[test]
fn test_unknown_doctor_filter() {
    let s = seed();
    let err = s
        .core
        .build_report(ReportKind::Doctors, april(), &ReportFilter::doctor("nobody"))
        .unwrap_err();
    assert!(matches!(err, HospitalError::NotFound(_)));
}

#[test]
fn test_empty_range_reports_zeroes() {
    let s = seed();
    let range = DateRange::new(
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
    )
    .unwrap();
    let report = s
        .core
        .build_report(ReportKind::Revenue, range, &ReportFilter::default())
        .unwrap();

    assert_eq!(report.metric("Invoices"), Some(MetricValue::Count(0)));
    assert_eq!(report.metric("Total billed"), Some(MetricValue::Amount(Decimal::ZERO)));
}

#[test]
fn test_report_json_export() {
    let s = seed();
    let report = s
        .core
        .build_report(ReportKind::Doctors, april(), &ReportFilter::default())
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["kind"], "doctors");
    assert_eq!(json["title"], "Doctor Performance");
}
