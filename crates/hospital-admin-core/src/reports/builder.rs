//! Report aggregation.

use std::collections::{BTreeMap, HashMap, HashSet};

use rust_decimal::Decimal;

use super::{
    DateRange, Metric, ReportBody, ReportError, ReportFilter, ReportKind, ReportModel,
    ReportResult, ReportRows, ReportTable,
};
use crate::models::{AppointmentStatus, Doctor, LabOrderStatus, PaymentStatus};

/// Documented metric order for the appointment summary.
pub const APPOINTMENT_METRICS: [&str; 5] = [
    "Total appointments",
    "Scheduled",
    "Completed",
    "Cancelled",
    "No-show",
];

/// Documented metric order for the revenue summary.
pub const REVENUE_METRICS: [&str; 7] = [
    "Invoices",
    "Total billed",
    "Collected",
    "Outstanding",
    "Paid invoices",
    "Partially paid invoices",
    "Pending invoices",
];

pub const DEPARTMENT_COLUMNS: [&str; 5] =
    ["Department", "Doctors", "Appointments", "Completed", "Cancelled"];

pub const DOCTOR_COLUMNS: [&str; 7] = [
    "Doctor",
    "Specialization",
    "Department",
    "Appointments",
    "Completed",
    "Cancelled",
    "Prescriptions",
];

pub const MEDICINE_COLUMNS: [&str; 4] = ["Medicine", "Prescriptions", "Total quantity", "Patients"];

pub const LAB_TEST_COLUMNS: [&str; 5] = ["Test", "Orders", "Completed", "Pending", "Revenue"];

/// Build a report over already-fetched rows.
///
/// Rows outside `range` are ignored. Doctor and department filters narrow
/// appointment, prescription and lab activity to the matching doctors; the
/// revenue summary is hospital-wide because invoices carry no doctor.
pub fn build_report(
    kind: ReportKind,
    range: DateRange,
    filter: &ReportFilter,
    rows: &ReportRows,
) -> ReportResult<ReportModel> {
    let scope = DoctorScope::new(filter, &rows.doctors)?;

    let body = match kind {
        ReportKind::Appointments => ReportBody::Scalar(appointment_summary(range, &scope, rows)),
        ReportKind::Revenue => ReportBody::Scalar(revenue_summary(range, rows)),
        ReportKind::Departments => ReportBody::Table(department_table(range, &scope, rows)),
        ReportKind::Doctors => ReportBody::Table(doctor_table(range, &scope, rows)),
        ReportKind::Medicines => ReportBody::Table(medicine_table(range, &scope, rows)),
        ReportKind::LabTests => ReportBody::Table(lab_test_table(range, &scope, rows)),
    };

    Ok(ReportModel {
        kind,
        title: kind.title().to_string(),
        range,
        filter: filter.clone(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        body,
    })
}

/// Doctors selected by the filter. `None` means no narrowing.
struct DoctorScope<'a> {
    doctors: Vec<&'a Doctor>,
    ids: Option<HashSet<&'a str>>,
}

impl<'a> DoctorScope<'a> {
    fn new(filter: &ReportFilter, doctors: &'a [Doctor]) -> ReportResult<Self> {
        if let Some(id) = &filter.doctor_id {
            if !doctors.iter().any(|d| &d.id == id) {
                return Err(ReportError::UnknownDoctor(id.clone()));
            }
        }

        let selected: Vec<&Doctor> = doctors
            .iter()
            .filter(|d| filter.doctor_id.as_ref().map_or(true, |id| &d.id == id))
            .filter(|d| {
                filter
                    .department
                    .as_ref()
                    .map_or(true, |dept| d.department.eq_ignore_ascii_case(dept.trim()))
            })
            .collect();

        let ids = if filter.is_empty() {
            None
        } else {
            Some(selected.iter().map(|d| d.id.as_str()).collect())
        };

        Ok(Self {
            doctors: selected,
            ids,
        })
    }

    fn includes(&self, doctor_id: &str) -> bool {
        self.ids.as_ref().map_or(true, |ids| ids.contains(doctor_id))
    }

    fn includes_optional(&self, doctor_id: Option<&str>) -> bool {
        match (&self.ids, doctor_id) {
            (None, _) => true,
            (Some(ids), Some(id)) => ids.contains(id),
            (Some(_), None) => false,
        }
    }
}

#[derive(Default)]
struct AppointmentTally {
    total: usize,
    completed: usize,
    cancelled: usize,
}

fn tally_appointments<'a>(
    range: DateRange,
    scope: &DoctorScope<'_>,
    rows: &'a ReportRows,
) -> HashMap<&'a str, AppointmentTally> {
    let mut tallies: HashMap<&str, AppointmentTally> = HashMap::new();
    for appt in rows
        .appointments
        .iter()
        .filter(|a| range.contains(a.date) && scope.includes(&a.doctor_id))
    {
        let tally = tallies.entry(appt.doctor_id.as_str()).or_default();
        tally.total += 1;
        match appt.status {
            AppointmentStatus::Completed => tally.completed += 1,
            AppointmentStatus::Cancelled => tally.cancelled += 1,
            _ => {}
        }
    }
    tallies
}

fn appointment_summary(range: DateRange, scope: &DoctorScope<'_>, rows: &ReportRows) -> Vec<Metric> {
    let in_scope: Vec<_> = rows
        .appointments
        .iter()
        .filter(|a| range.contains(a.date) && scope.includes(&a.doctor_id))
        .collect();
    let count = |status: AppointmentStatus| in_scope.iter().filter(|a| a.status == status).count();

    vec![
        Metric::count(APPOINTMENT_METRICS[0], in_scope.len()),
        Metric::count(APPOINTMENT_METRICS[1], count(AppointmentStatus::Scheduled)),
        Metric::count(APPOINTMENT_METRICS[2], count(AppointmentStatus::Completed)),
        Metric::count(APPOINTMENT_METRICS[3], count(AppointmentStatus::Cancelled)),
        Metric::count(APPOINTMENT_METRICS[4], count(AppointmentStatus::NoShow)),
    ]
}

fn revenue_summary(range: DateRange, rows: &ReportRows) -> Vec<Metric> {
    let invoices: Vec<_> = rows
        .invoices
        .iter()
        .filter(|i| range.contains(i.invoice_date))
        .collect();

    let billed: Decimal = invoices.iter().map(|i| i.total_amount).sum();
    let collected: Decimal = invoices.iter().map(|i| i.paid_amount).sum();
    let count = |status: PaymentStatus| invoices.iter().filter(|i| i.payment_status == status).count();

    vec![
        Metric::count(REVENUE_METRICS[0], invoices.len()),
        Metric::amount(REVENUE_METRICS[1], billed),
        Metric::amount(REVENUE_METRICS[2], collected),
        Metric::amount(REVENUE_METRICS[3], billed - collected),
        Metric::count(REVENUE_METRICS[4], count(PaymentStatus::Paid)),
        Metric::count(REVENUE_METRICS[5], count(PaymentStatus::PartiallyPaid)),
        Metric::count(REVENUE_METRICS[6], count(PaymentStatus::Pending)),
    ]
}

fn columns(names: &[&str]) -> Vec<String> {
    names.iter().map(|c| c.to_string()).collect()
}

fn department_table(range: DateRange, scope: &DoctorScope<'_>, rows: &ReportRows) -> ReportTable {
    let tallies = tally_appointments(range, scope, rows);

    // department -> (doctors, appointments, completed, cancelled)
    let mut departments: BTreeMap<&str, (usize, usize, usize, usize)> = BTreeMap::new();
    for doctor in &scope.doctors {
        let entry = departments.entry(doctor.department.as_str()).or_default();
        entry.0 += 1;
        if let Some(tally) = tallies.get(doctor.id.as_str()) {
            entry.1 += tally.total;
            entry.2 += tally.completed;
            entry.3 += tally.cancelled;
        }
    }

    let mut ordered: Vec<_> = departments.into_iter().collect();
    ordered.sort_by(|a, b| b.1 .1.cmp(&a.1 .1).then_with(|| a.0.cmp(b.0)));

    ReportTable {
        columns: columns(&DEPARTMENT_COLUMNS),
        rows: ordered
            .into_iter()
            .map(|(name, (doctors, total, completed, cancelled))| {
                vec![
                    name.to_string(),
                    doctors.to_string(),
                    total.to_string(),
                    completed.to_string(),
                    cancelled.to_string(),
                ]
            })
            .collect(),
    }
}

fn doctor_table(range: DateRange, scope: &DoctorScope<'_>, rows: &ReportRows) -> ReportTable {
    let tallies = tally_appointments(range, scope, rows);

    let mut prescriptions: HashMap<&str, usize> = HashMap::new();
    for rx in rows
        .prescriptions
        .iter()
        .filter(|p| range.contains(p.prescribed_on) && scope.includes(&p.doctor_id))
    {
        *prescriptions.entry(rx.doctor_id.as_str()).or_default() += 1;
    }

    let empty = AppointmentTally::default();
    let mut doctors: Vec<_> = scope
        .doctors
        .iter()
        .map(|d| (*d, tallies.get(d.id.as_str()).unwrap_or(&empty)))
        .collect();
    doctors.sort_by(|a, b| b.1.total.cmp(&a.1.total).then_with(|| a.0.name.cmp(&b.0.name)));

    ReportTable {
        columns: columns(&DOCTOR_COLUMNS),
        rows: doctors
            .into_iter()
            .map(|(doctor, tally)| {
                vec![
                    doctor.name.clone(),
                    doctor.specialization.clone(),
                    doctor.department.clone(),
                    tally.total.to_string(),
                    tally.completed.to_string(),
                    tally.cancelled.to_string(),
                    prescriptions
                        .get(doctor.id.as_str())
                        .copied()
                        .unwrap_or(0)
                        .to_string(),
                ]
            })
            .collect(),
    }
}

fn medicine_table(range: DateRange, scope: &DoctorScope<'_>, rows: &ReportRows) -> ReportTable {
    struct Usage<'a> {
        name: &'a str,
        prescriptions: usize,
        quantity: u64,
        patients: HashSet<&'a str>,
    }

    // Keyed case-insensitively; the first spelling seen is displayed.
    let mut usage: HashMap<String, Usage<'_>> = HashMap::new();
    for rx in rows
        .prescriptions
        .iter()
        .filter(|p| range.contains(p.prescribed_on) && scope.includes(&p.doctor_id))
    {
        let name = rx.medicine.trim();
        let entry = usage.entry(name.to_lowercase()).or_insert_with(|| Usage {
            name,
            prescriptions: 0,
            quantity: 0,
            patients: HashSet::new(),
        });
        entry.prescriptions += 1;
        entry.quantity += u64::from(rx.quantity);
        entry.patients.insert(rx.patient_id.as_str());
    }

    let mut ordered: Vec<_> = usage.into_values().collect();
    ordered.sort_by(|a, b| {
        b.prescriptions
            .cmp(&a.prescriptions)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });

    ReportTable {
        columns: columns(&MEDICINE_COLUMNS),
        rows: ordered
            .into_iter()
            .map(|u| {
                vec![
                    u.name.to_string(),
                    u.prescriptions.to_string(),
                    u.quantity.to_string(),
                    u.patients.len().to_string(),
                ]
            })
            .collect(),
    }
}

fn lab_test_table(range: DateRange, scope: &DoctorScope<'_>, rows: &ReportRows) -> ReportTable {
    #[derive(Default)]
    struct Volume {
        orders: usize,
        completed: usize,
        pending: usize,
    }

    let mut volumes: BTreeMap<&str, Volume> = BTreeMap::new();
    for order in rows
        .lab_orders
        .iter()
        .filter(|o| range.contains(o.ordered_on) && scope.includes_optional(o.doctor_id.as_deref()))
    {
        let volume = volumes.entry(order.test_code.as_str()).or_default();
        volume.orders += 1;
        match order.status {
            LabOrderStatus::Completed => volume.completed += 1,
            status if status.is_open() => volume.pending += 1,
            _ => {}
        }
    }

    let mut ordered: Vec<_> = volumes.into_iter().collect();
    ordered.sort_by(|a, b| b.1.orders.cmp(&a.1.orders).then_with(|| a.0.cmp(b.0)));

    ReportTable {
        columns: columns(&LAB_TEST_COLUMNS),
        rows: ordered
            .into_iter()
            .map(|(code, volume)| {
                let test = rows.lab_tests.iter().find(|t| t.code == code);
                let name = test.map(|t| t.name.clone()).unwrap_or_else(|| code.to_string());
                let price = test.map(|t| t.price).unwrap_or(Decimal::ZERO);
                let revenue = price * Decimal::from(volume.completed as u64);
                vec![
                    name,
                    volume.orders.to_string(),
                    volume.completed.to_string(),
                    volume.pending.to_string(),
                    format!("{:.2}", revenue),
                ]
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Appointment, Invoice, LabOrder, LabTest, Prescription};
    use crate::reports::MetricValue;
    use chrono::NaiveDate;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    fn april() -> DateRange {
        DateRange::new(date(1), date(30)).unwrap()
    }

    fn doctor(id: &str, name: &str, department: &str) -> Doctor {
        let mut d = Doctor::new(name.into(), department.into(), department.into());
        d.id = id.into();
        d
    }

    fn appointment(doctor_id: &str, day: u32, status: AppointmentStatus) -> Appointment {
        let mut a = Appointment::new("patient-1".into(), doctor_id.into(), date(day), "10:00".into());
        a.status = status;
        a
    }

    fn invoice(day: u32, total: i64, paid: i64) -> Invoice {
        let total = Decimal::new(total, 2);
        let paid = Decimal::new(paid, 2);
        Invoice {
            id: format!("inv-{}-{}", day, total),
            invoice_number: "INV".into(),
            patient_id: "patient-1".into(),
            items: vec![],
            subtotal: total,
            tax_amount: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            total_amount: total,
            paid_amount: paid,
            payment_status: crate::billing::payment_status(paid, total),
            invoice_date: date(day),
            due_date: None,
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn sample_rows() -> ReportRows {
        ReportRows {
            doctors: vec![
                doctor("d1", "Dr. Adams", "Cardiology"),
                doctor("d2", "Dr. Baker", "Cardiology"),
                doctor("d3", "Dr. Chen", "Pediatrics"),
            ],
            appointments: vec![
                appointment("d1", 2, AppointmentStatus::Completed),
                appointment("d1", 3, AppointmentStatus::Completed),
                appointment("d1", 4, AppointmentStatus::Cancelled),
                appointment("d2", 5, AppointmentStatus::Scheduled),
                appointment("d3", 6, AppointmentStatus::NoShow),
                appointment("d3", 7, AppointmentStatus::Completed),
                // Outside the range
                Appointment::new(
                    "patient-2".into(),
                    "d1".into(),
                    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                    "10:00".into(),
                ),
            ],
            invoices: vec![invoice(2, 10000, 10000), invoice(3, 5000, 2000), invoice(4, 2500, 0)],
            prescriptions: vec![
                Prescription::new("patient-1".into(), "d1".into(), "Aspirin".into(), 30, date(2)),
                Prescription::new("patient-2".into(), "d1".into(), "aspirin ".into(), 10, date(3)),
                Prescription::new("patient-1".into(), "d3".into(), "Paracetamol".into(), 12, date(6)),
            ],
            lab_orders: {
                let mut done = LabOrder::new("patient-1".into(), "CBC".into(), date(2));
                done.doctor_id = Some("d1".into());
                done.status = LabOrderStatus::Completed;
                let mut open = LabOrder::new("patient-2".into(), "CBC".into(), date(3));
                open.doctor_id = Some("d3".into());
                let walk_in = LabOrder::new("patient-3".into(), "LFT".into(), date(4));
                vec![done, open, walk_in]
            },
            lab_tests: vec![
                LabTest::new("CBC".into(), "Complete blood count".into(), Decimal::new(2500, 2)),
                LabTest::new("LFT".into(), "Liver function".into(), Decimal::new(4000, 2)),
            ],
        }
    }

    #[test]
    fn test_appointment_summary() {
        let report = build_report(
            ReportKind::Appointments,
            april(),
            &ReportFilter::default(),
            &sample_rows(),
        )
        .unwrap();

        let metrics = report.metrics().unwrap();
        let labels: Vec<_> = metrics.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, APPOINTMENT_METRICS);
        assert_eq!(report.metric("Total appointments"), Some(MetricValue::Count(6)));
        assert_eq!(report.metric("Completed"), Some(MetricValue::Count(3)));
        assert_eq!(report.metric("No-show"), Some(MetricValue::Count(1)));
    }

    #[test]
    fn test_appointment_summary_for_doctor() {
        let report = build_report(
            ReportKind::Appointments,
            april(),
            &ReportFilter::doctor("d1"),
            &sample_rows(),
        )
        .unwrap();
        assert_eq!(report.metric("Total appointments"), Some(MetricValue::Count(3)));
        assert_eq!(report.metric("Cancelled"), Some(MetricValue::Count(1)));
    }

    #[test]
    fn test_unknown_doctor_filter() {
        let err = build_report(
            ReportKind::Doctors,
            april(),
            &ReportFilter::doctor("nobody"),
            &sample_rows(),
        )
        .unwrap_err();
        assert_eq!(err, ReportError::UnknownDoctor("nobody".into()));
    }

    #[test]
    fn test_revenue_summary() {
        let report = build_report(ReportKind::Revenue, april(), &ReportFilter::default(), &sample_rows())
            .unwrap();
        assert_eq!(report.metric("Invoices"), Some(MetricValue::Count(3)));
        assert_eq!(report.metric("Total billed"), Some(MetricValue::Amount(Decimal::new(17500, 2))));
        assert_eq!(report.metric("Collected"), Some(MetricValue::Amount(Decimal::new(12000, 2))));
        assert_eq!(report.metric("Outstanding"), Some(MetricValue::Amount(Decimal::new(5500, 2))));
        assert_eq!(report.metric("Paid invoices"), Some(MetricValue::Count(1)));
        assert_eq!(report.metric("Partially paid invoices"), Some(MetricValue::Count(1)));
        assert_eq!(report.metric("Pending invoices"), Some(MetricValue::Count(1)));
    }

    #[test]
    fn test_department_table() {
        let report = build_report(
            ReportKind::Departments,
            april(),
            &ReportFilter::default(),
            &sample_rows(),
        )
        .unwrap();
        let table = report.table().unwrap();
        assert_eq!(table.columns, columns(&DEPARTMENT_COLUMNS));
        assert_eq!(table.rows[0], vec!["Cardiology", "2", "4", "2", "1"]);
        assert_eq!(table.rows[1], vec!["Pediatrics", "1", "2", "1", "0"]);
    }

    #[test]
    fn test_department_filter_is_case_insensitive() {
        let report = build_report(
            ReportKind::Doctors,
            april(),
            &ReportFilter::department("pediatrics"),
            &sample_rows(),
        )
        .unwrap();
        let table = report.table().unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], "Dr. Chen");
    }

    #[test]
    fn test_doctor_table_ordering() {
        let report = build_report(ReportKind::Doctors, april(), &ReportFilter::default(), &sample_rows())
            .unwrap();
        let table = report.table().unwrap();
        let names: Vec<_> = table.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(names, vec!["Dr. Adams", "Dr. Chen", "Dr. Baker"]);
        // Dr. Adams wrote two prescriptions
        assert_eq!(table.rows[0][6], "2");
    }

    #[test]
    fn test_medicine_table_merges_spellings() {
        let report = build_report(ReportKind::Medicines, april(), &ReportFilter::default(), &sample_rows())
            .unwrap();
        let table = report.table().unwrap();
        assert_eq!(table.rows[0], vec!["Aspirin", "2", "40", "2"]);
        assert_eq!(table.rows[1], vec!["Paracetamol", "1", "12", "1"]);
    }

    #[test]
    fn test_lab_test_table() {
        let report = build_report(ReportKind::LabTests, april(), &ReportFilter::default(), &sample_rows())
            .unwrap();
        let table = report.table().unwrap();
        assert_eq!(table.rows[0], vec!["Complete blood count", "2", "1", "1", "25.00"]);
        assert_eq!(table.rows[1], vec!["Liver function", "1", "0", "1", "0.00"]);
    }

    #[test]
    fn test_lab_filter_excludes_walk_ins() {
        let report = build_report(
            ReportKind::LabTests,
            april(),
            &ReportFilter::department("Cardiology"),
            &sample_rows(),
        )
        .unwrap();
        let table = report.table().unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][1], "1");
    }
}
