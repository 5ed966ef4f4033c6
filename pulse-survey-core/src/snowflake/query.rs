//! The one fixed report statement.
//!
//! Table names are compile-time constants; the statement takes no
//! parameters and no untrusted input is ever interpolated into it.

/// Survey responses, one row per submission.
pub const SURVEY_REPORT_TABLE: &str = "PULSE_SURVEY.INTERMEDIATE.INT_PULSE_SURVEY_REPORT";
/// Mapping from encoded submitter emails to real employee emails.
pub const EMAIL_MAPPING_TABLE: &str = "PULSE_SURVEY.INTERMEDIATE.INT_EMP_EMAIL_MAPPING";
/// Employee to manager hierarchy reference data.
pub const EMPLOYEE_HIERARCHY_TABLE: &str = "PULSE_SURVEY.CURATED.EMPLOYEE_HIERARCHY";
/// Per-response sentiment scores maintained by the wider pipeline.
pub const SURVEY_SENTIMENT_DETAILS_TABLE: &str = "PULSE_SURVEY.INTERMEDIATE.SURVEY_SENTIMENT_DETAILS";
/// Manager emails currently enrolled for the weekly summary.
pub const RECIPIENT_LIST_WEEKLY_TABLE: &str =
    "PULSE_SURVEY.CURATED.PULSE_SURVEY_RECIPIENT_LIST_WEEKLY";

/// Builds the report statement: survey responses joined to decoded emails
/// and the employee hierarchy, then filtered to managers on the weekly
/// recipient list.
///
/// The final INNER JOIN is deliberate: responses whose resolved manager is
/// not an active weekly recipient are silently dropped, and this is the
/// statement's only filtering logic.
pub fn report_query() -> String {
    format!(
        "SELECT \
         r.EMP_ID, \
         r.EMP_NAME, \
         r.EMP_EMAIL AS EMP_EMAIL_ENCODED, \
         m.EMP_EMAIL AS EMP_EMAIL_REAL, \
         h.EMPLOYEE_NAME AS HIER_EMPLOYEE_NAME, \
         h.EMPLOYEE_EMAIL AS HIER_EMPLOYEE_EMAIL, \
         h.MANAGER_NAME AS HIER_MANAGER_NAME, \
         h.MANAGER_EMAIL AS HIER_MANAGER_EMAIL, \
         r.PULSE_SURVEY_DATE, \
         r.SUBMISSION_DATE, \
         r.BUSINESS_UNIT, \
         r.DEPT, \
         r.EMP_REGION, \
         r.I_FEEL_EMPOWERED_AND_ACCOUNTABLE_TO_ACHIEVE_MY_DILIGENT_GOALS, \
         r.HAVE_YOU_HAD_A_1_ON_1_WITH_YOUR_MANAGER_IN_THE_LAST_ONE_OR_TWO_WEEKS, \
         r.PLEASE_SHARE_WHY_YOU_CHOSE_THIS_SCORE_THIS_WEEK \
         FROM {SURVEY_REPORT_TABLE} r \
         LEFT JOIN {EMAIL_MAPPING_TABLE} m ON r.EMP_EMAIL = m.ENCODED_EMAIL \
         LEFT JOIN {EMPLOYEE_HIERARCHY_TABLE} h ON m.EMP_EMAIL = h.EMPLOYEE_EMAIL \
         INNER JOIN {RECIPIENT_LIST_WEEKLY_TABLE} mm ON h.MANAGER_EMAIL = mm.RECIPIENT"
    )
}
