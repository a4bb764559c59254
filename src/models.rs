use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Student {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub grade_level: Option<String>,
    pub organization_id: Option<Uuid>,
}

impl Student {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A plan goal. `status` is whatever the record store holds; reporting
/// classifies by `progress` through [`Goal::classification`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Goal {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub student_id: Uuid,
    pub domain: GoalDomain,
    /// Percent complete, always within 0..=100.
    pub progress: u8,
    pub status: GoalStatus,
}

impl Goal {
    pub fn classification(&self) -> ProgressClass {
        ProgressClass::of(self.progress)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BehaviorEvent {
    pub id: Uuid,
    pub student_id: Uuid,
    pub occurred_at: NaiveDateTime,
    pub incident_type: IncidentType,
    pub severity: Severity,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonPlan {
    pub id: Uuid,
    /// `None` for reusable templates.
    pub student_id: Option<Uuid>,
    pub subject: SubjectArea,
    pub scheduled_on: NaiveDate,
    pub status: LessonStatus,
}

/// Lowercases a stored label and folds every run of punctuation or
/// whitespace into a single underscore, so `"Academic - Reading"` and
/// `"academic_reading"` compare equal.
fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for ch in label.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalDomain {
    AcademicReading,
    AcademicMath,
    AcademicWriting,
    Communication,
    SocialEmotional,
    Behavior,
    FunctionalLifeSkills,
    Transition,
    MotorSkills,
    Vocational,
    Other,
}

impl GoalDomain {
    /// Strict lookup for user input; `None` for labels no domain answers to.
    pub fn parse(label: &str) -> Option<Self> {
        let domain = match normalize_label(label).as_str() {
            "academic_reading" | "reading" => Self::AcademicReading,
            "academic_math" | "math" => Self::AcademicMath,
            "academic_writing" | "writing" => Self::AcademicWriting,
            "communication" => Self::Communication,
            "social_emotional" => Self::SocialEmotional,
            "behavior" => Self::Behavior,
            "functional_life_skills" | "life_skills" => Self::FunctionalLifeSkills,
            "transition" => Self::Transition,
            "motor_skills" => Self::MotorSkills,
            "vocational" => Self::Vocational,
            "other" => Self::Other,
            _ => return None,
        };
        Some(domain)
    }

    pub fn from_label(label: &str) -> Self {
        Self::parse(label).unwrap_or(Self::Other)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::AcademicReading => "Academic - Reading",
            Self::AcademicMath => "Academic - Math",
            Self::AcademicWriting => "Academic - Writing",
            Self::Communication => "Communication",
            Self::SocialEmotional => "Social/Emotional",
            Self::Behavior => "Behavior",
            Self::FunctionalLifeSkills => "Functional Life Skills",
            Self::Transition => "Transition",
            Self::MotorSkills => "Motor Skills",
            Self::Vocational => "Vocational",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    NotStarted,
    InProgress,
    Mastered,
    Discontinued,
    Other,
}

impl GoalStatus {
    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "not_started" => Self::NotStarted,
            "in_progress" => Self::InProgress,
            "mastered" => Self::Mastered,
            "discontinued" => Self::Discontinued,
            _ => Self::Other,
        }
    }
}

/// Progress-derived classification used by every goal count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressClass {
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressClass {
    pub fn of(progress: u8) -> Self {
        match progress {
            0 => Self::NotStarted,
            100..=u8::MAX => Self::Completed,
            _ => Self::InProgress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    Aggressive,
    Disruptive,
    NonCompliance,
    SelfInjury,
    PropertyDestruction,
    VerbalOutburst,
    Withdrawal,
    Positive,
    Other,
}

impl IncidentType {
    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "aggressive" | "aggression" => Self::Aggressive,
            "disruptive" | "disruption" => Self::Disruptive,
            "non_compliance" | "noncompliance" => Self::NonCompliance,
            "self_injury" => Self::SelfInjury,
            "property_destruction" => Self::PropertyDestruction,
            "verbal_outburst" => Self::VerbalOutburst,
            "withdrawal" => Self::Withdrawal,
            "positive" => Self::Positive,
            _ => Self::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Aggressive => "Aggressive",
            Self::Disruptive => "Disruptive",
            Self::NonCompliance => "Non-Compliance",
            Self::SelfInjury => "Self-Injury",
            Self::PropertyDestruction => "Property Destruction",
            Self::VerbalOutburst => "Verbal Outburst",
            Self::Withdrawal => "Withdrawal",
            Self::Positive => "Positive",
            Self::Other => "Other",
        }
    }
}

/// Ordered by intensity; `Other` collects unrecognized labels and sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Extreme,
    Other,
}

impl Severity {
    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "low" => Self::Low,
            "moderate" | "medium" => Self::Moderate,
            "high" => Self::High,
            "extreme" => Self::Extreme,
            _ => Self::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
            Self::Extreme => "Extreme",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectArea {
    Reading,
    Math,
    Writing,
    Science,
    SocialStudies,
    LifeSkills,
    Communication,
    Behavior,
    Transition,
    PhysicalEducation,
    Art,
    Music,
    Vocational,
    Other,
}

impl SubjectArea {
    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "reading" => Self::Reading,
            "math" | "mathematics" => Self::Math,
            "writing" => Self::Writing,
            "science" => Self::Science,
            "social_studies" => Self::SocialStudies,
            "life_skills" => Self::LifeSkills,
            "communication" => Self::Communication,
            "behavior" => Self::Behavior,
            "transition" => Self::Transition,
            "physical_education" | "pe" => Self::PhysicalEducation,
            "art" => Self::Art,
            "music" => Self::Music,
            "vocational" => Self::Vocational,
            _ => Self::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Reading => "Reading",
            Self::Math => "Math",
            Self::Writing => "Writing",
            Self::Science => "Science",
            Self::SocialStudies => "Social Studies",
            Self::LifeSkills => "Life Skills",
            Self::Communication => "Communication",
            Self::Behavior => "Behavior",
            Self::Transition => "Transition",
            Self::PhysicalEducation => "Physical Education",
            Self::Art => "Art",
            Self::Music => "Music",
            Self::Vocational => "Vocational",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    Planned,
    InProgress,
    Completed,
    Other,
}

impl LessonStatus {
    pub fn from_label(label: &str) -> Self {
        match normalize_label(label).as_str() {
            "planned" => Self::Planned,
            "in_progress" => Self::InProgress,
            "completed" => Self::Completed,
            _ => Self::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_normalize_across_spellings() {
        assert_eq!(normalize_label("Academic - Reading"), "academic_reading");
        assert_eq!(normalize_label("  Social/Emotional "), "social_emotional");
        assert_eq!(normalize_label("in_progress"), "in_progress");
        assert_eq!(normalize_label("---"), "");
    }

    #[test]
    fn categorical_labels_fall_back_to_other() {
        assert_eq!(GoalDomain::from_label("Academic - Math"), GoalDomain::AcademicMath);
        assert_eq!(GoalDomain::from_label("reading"), GoalDomain::AcademicReading);
        assert_eq!(GoalDomain::from_label("astronomy"), GoalDomain::Other);
        assert_eq!(IncidentType::from_label("Non-Compliance"), IncidentType::NonCompliance);
        assert_eq!(IncidentType::from_label("tardy"), IncidentType::Other);
        assert_eq!(Severity::from_label("HIGH"), Severity::High);
        assert_eq!(Severity::from_label("catastrophic"), Severity::Other);
        assert_eq!(SubjectArea::from_label("Social Studies"), SubjectArea::SocialStudies);
        assert_eq!(LessonStatus::from_label("in-progress"), LessonStatus::InProgress);
        assert_eq!(GoalStatus::from_label("mastered"), GoalStatus::Mastered);
    }

    #[test]
    fn strict_domain_parse_rejects_unknown_labels() {
        assert_eq!(GoalDomain::parse("Motor Skills"), Some(GoalDomain::MotorSkills));
        assert_eq!(GoalDomain::parse("other"), Some(GoalDomain::Other));
        assert_eq!(GoalDomain::parse("astronomy"), None);
        assert_eq!(GoalDomain::parse(""), None);
    }

    #[test]
    fn severity_orders_by_intensity() {
        assert!(Severity::Low < Severity::Moderate);
        assert!(Severity::High < Severity::Extreme);
    }

    #[test]
    fn classification_ignores_stored_status() {
        let goal = Goal {
            id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            domain: GoalDomain::Communication,
            progress: 100,
            status: GoalStatus::InProgress,
        };
        assert_eq!(goal.classification(), ProgressClass::Completed);
        assert_eq!(goal.status, GoalStatus::InProgress);
        assert_eq!(ProgressClass::of(0), ProgressClass::NotStarted);
        assert_eq!(ProgressClass::of(99), ProgressClass::InProgress);
    }
}
