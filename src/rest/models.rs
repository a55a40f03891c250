use serde::{Deserialize, Serialize};

use crate::types::{Completion, FileEntry, Order};

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SetupRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// `level` arrives as a number or a string depending on the client form.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TechnicianRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub level: Option<serde_json::Value>,
}

impl TechnicianRequest {
    pub fn parsed_level(&self) -> Option<i64> {
        match self.level.as_ref()? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct TechnicianResponse {
    pub name: String,
    pub username: String,
    pub level: i64,
}

#[derive(Serialize, Deserialize)]
pub struct FileEntryResponse {
    pub original_name: String,
    pub stored_name: String,
    pub uploaded_at: String,
}

#[derive(Serialize, Deserialize)]
pub struct PhotoResponse {
    pub original_name: String,
    pub stored_name: String,
    pub uploaded_at: String,
    pub url: String,
}

#[derive(Serialize, Deserialize)]
pub struct CompletionResponse {
    pub mount_type: String,
    pub note: String,
    pub photo_count: usize,
    pub completed_at: String,
}

#[derive(Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub job_no: String,
    pub priority: String,
    pub name: String,
    pub model: String,
    pub phone: String,
    pub service: String,
    pub reference: String,
    pub address: String,
    pub note: String,
    pub created_at: String,
    pub invoice_uploaded: bool,
    pub invoice_url: String,
    pub invoice: Option<FileEntryResponse>,
    pub photos: Vec<PhotoResponse>,
    pub completed: bool,
    pub completion: Option<CompletionResponse>,
}

/// Single-order envelope; `message` rides along on mutations.
#[derive(Serialize, Deserialize)]
pub struct OrderEnvelope {
    pub order: OrderResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct TechnicianEnvelope {
    pub technician: TechnicianResponse,
    pub message: String,
}

fn file_entry_response(entry: &FileEntry) -> FileEntryResponse {
    FileEntryResponse {
        original_name: entry.original_name.clone(),
        stored_name: entry.stored_name.clone(),
        uploaded_at: entry.uploaded_at.to_rfc3339(),
    }
}

fn photo_response(entry: &FileEntry) -> PhotoResponse {
    PhotoResponse {
        original_name: entry.original_name.clone(),
        stored_name: entry.stored_name.clone(),
        uploaded_at: entry.uploaded_at.to_rfc3339(),
        url: format!("/photos/{}", entry.stored_name),
    }
}

fn completion_response(completion: &Completion) -> CompletionResponse {
    CompletionResponse {
        mount_type: completion
            .mount_type
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        note: completion.note.clone(),
        photo_count: completion.photo_count,
        completed_at: completion.completed_at.to_rfc3339(),
    }
}

impl OrderResponse {
    pub fn from_order(order: &Order) -> Self {
        let invoice_url = order
            .invoice
            .as_ref()
            .map(|inv| format!("/invoices/{}", inv.stored_name))
            .unwrap_or_default();
        Self {
            id: order.job_no.clone(),
            job_no: order.job_no.clone(),
            priority: order.priority.as_str().to_string(),
            name: order.name.clone(),
            model: order.model.clone(),
            phone: order.phone.clone(),
            service: order.service.clone(),
            reference: order.reference.clone(),
            address: order.address.clone(),
            note: order.note.clone(),
            created_at: order.created_at.to_rfc3339(),
            invoice_uploaded: order.invoice.is_some(),
            invoice_url,
            invoice: order.invoice.as_ref().map(file_entry_response),
            photos: order.photos.iter().map(photo_response).collect(),
            completed: order.completed,
            completion: order.completion.as_ref().map(completion_response),
        }
    }
}
