use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("missing fields: {0}")]
    MissingFields(String),
    #[error("invalid mount type")]
    InvalidMountType,
}

/// Trims and upper-cases a free-text field. All customer-facing text is
/// stored in this canonical form.
pub fn normalize_text(value: &str) -> String {
    value.trim().to_uppercase()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Unknown or empty input falls back to `Low`.
    pub fn parse_or_default(input: &str) -> Self {
        match normalize_text(input).as_str() {
            "HIGH" => Priority::High,
            "MEDIUM" => Priority::Medium,
            _ => Priority::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }

    /// Sort rank for the open-installations listing, most urgent first.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MountType {
    Wall,
    Stand,
    Other,
}

impl MountType {
    /// Empty input means "not specified"; anything outside the allow-list
    /// is rejected rather than defaulted.
    pub fn parse(input: &str) -> Result<Option<Self>, ValidationError> {
        match normalize_text(input).as_str() {
            "" => Ok(None),
            "WALL" => Ok(Some(MountType::Wall)),
            "STAND" => Ok(Some(MountType::Stand)),
            "OTHER" => Ok(Some(MountType::Other)),
            _ => Err(ValidationError::InvalidMountType),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MountType::Wall => "WALL",
            MountType::Stand => "STAND",
            MountType::Other => "OTHER",
        }
    }
}

/// An uploaded file attached to an order, either the invoice or one
/// completion photo.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub original_name: String,
    pub stored_name: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
    pub mount_type: Option<MountType>,
    pub note: String,
    pub photo_count: usize,
    pub completed_at: DateTime<Utc>,
}

/// A work order document. `job_no` is unique and immutable once assigned.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub job_no: String,
    pub priority: Priority,
    pub name: String,
    pub model: String,
    pub phone: String,
    pub service: String,
    pub reference: String,
    pub address: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub invoice: Option<FileEntry>,
    pub photos: Vec<FileEntry>,
    pub completed: bool,
    pub completion: Option<Completion>,
}

impl Order {
    /// Installation orders are the ones that go through the completion
    /// flow and carry the public invoice-upload link.
    pub fn is_installation(&self) -> bool {
        self.service.contains("INSTALL")
    }
}

/// Incoming order payload before validation and normalization.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrderDraft {
    pub priority: Option<String>,
    pub name: Option<String>,
    pub model: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub reference: Option<String>,
    pub address: Option<String>,
    pub note: Option<String>,
}

impl OrderDraft {
    const REQUIRED: [&'static str; 6] = ["priority", "name", "model", "phone", "service", "address"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "priority" => self.priority.as_deref(),
            "name" => self.name.as_deref(),
            "model" => self.model.as_deref(),
            "phone" => self.phone.as_deref(),
            "service" => self.service.as_deref(),
            "reference" => self.reference.as_deref(),
            "address" => self.address.as_deref(),
            _ => None,
        }
    }

    pub fn into_order(
        self,
        job_no: String,
        created_at: DateTime<Utc>,
    ) -> Result<Order, ValidationError> {
        let missing: Vec<&str> = Self::REQUIRED
            .iter()
            .filter(|name| {
                self.field(name)
                    .map(|v| v.trim().is_empty())
                    .unwrap_or(true)
            })
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing.join(", ")));
        }

        Ok(Order {
            job_no,
            priority: Priority::parse_or_default(self.priority.as_deref().unwrap_or("")),
            name: normalize_text(self.name.as_deref().unwrap_or("")),
            model: normalize_text(self.model.as_deref().unwrap_or("")),
            phone: normalize_text(self.phone.as_deref().unwrap_or("")),
            service: normalize_text(self.service.as_deref().unwrap_or("")),
            reference: normalize_text(self.reference.as_deref().unwrap_or("")),
            address: normalize_text(self.address.as_deref().unwrap_or("")),
            note: self.note.as_deref().unwrap_or("").trim().to_string(),
            created_at,
            invoice: None,
            photos: Vec::new(),
            completed: false,
            completion: None,
        })
    }
}

/// Partial update; only the allow-listed fields can change after creation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrderUpdate {
    pub priority: Option<String>,
    pub name: Option<String>,
    pub model: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub reference: Option<String>,
    pub address: Option<String>,
}

impl OrderUpdate {
    /// Applies the present fields to `order`, returning how many fields
    /// actually changed hands.
    pub fn apply(&self, order: &mut Order) -> usize {
        let mut applied = 0;
        if let Some(value) = &self.priority {
            order.priority = Priority::parse_or_default(value);
            applied += 1;
        }
        let text_fields: [(&Option<String>, &mut String); 6] = [
            (&self.name, &mut order.name),
            (&self.model, &mut order.model),
            (&self.phone, &mut order.phone),
            (&self.service, &mut order.service),
            (&self.reference, &mut order.reference),
            (&self.address, &mut order.address),
        ];
        for (input, target) in text_fields {
            if let Some(value) = input {
                *target = normalize_text(value);
                applied += 1;
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> OrderDraft {
        OrderDraft {
            priority: Some("high".into()),
            name: Some("  jane doe ".into()),
            model: Some("tv-55".into()),
            phone: Some("0555 111 22 33".into()),
            service: Some("tv install".into()),
            reference: None,
            address: Some("main st 1".into()),
            note: Some("  ring the bell  ".into()),
        }
    }

    #[test]
    fn draft_normalizes_and_uppercases() {
        let order = draft().into_order("WO-1234".into(), Utc::now()).unwrap();
        assert_eq!(order.priority, Priority::High);
        assert_eq!(order.name, "JANE DOE");
        assert_eq!(order.service, "TV INSTALL");
        assert_eq!(order.reference, "");
        assert_eq!(order.note, "ring the bell");
        assert!(order.is_installation());
        assert!(!order.completed);
        assert!(order.photos.is_empty());
    }

    #[test]
    fn draft_reports_all_missing_fields() {
        let draft = OrderDraft {
            name: Some("x".into()),
            ..Default::default()
        };
        let err = draft.into_order("WO-0001".into(), Utc::now()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("priority"));
        assert!(msg.contains("address"));
        assert!(!msg.contains("name"));
    }

    #[test]
    fn whitespace_only_field_counts_as_missing() {
        let mut d = draft();
        d.phone = Some("   ".into());
        let err = d.into_order("WO-0001".into(), Utc::now()).unwrap_err();
        assert!(err.to_string().contains("phone"));
    }

    #[test]
    fn unknown_priority_falls_back_to_low() {
        assert_eq!(Priority::parse_or_default("URGENT"), Priority::Low);
        assert_eq!(Priority::parse_or_default(" medium "), Priority::Medium);
    }

    #[test]
    fn mount_type_allow_list() {
        assert_eq!(MountType::parse(" wall ").unwrap(), Some(MountType::Wall));
        assert_eq!(MountType::parse("").unwrap(), None);
        assert!(MountType::parse("CEILING").is_err());
    }

    #[test]
    fn update_applies_only_present_fields() {
        let mut order = draft().into_order("WO-1234".into(), Utc::now()).unwrap();
        let update = OrderUpdate {
            name: Some("new name".into()),
            priority: Some("bogus".into()),
            ..Default::default()
        };
        assert_eq!(update.apply(&mut order), 2);
        assert_eq!(order.name, "NEW NAME");
        assert_eq!(order.priority, Priority::Low);
        assert_eq!(order.model, "TV-55");
    }

    #[test]
    fn empty_update_applies_nothing() {
        let mut order = draft().into_order("WO-1234".into(), Utc::now()).unwrap();
        assert_eq!(OrderUpdate::default().apply(&mut order), 0);
    }
}
