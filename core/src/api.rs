//! Request/response contract spoken to the mobile client.
//!
//! Field names follow what the client sends and reads. Failures become a
//! 4xx/5xx status with `{ "error": string }`; the client shows the string
//! as-is.

use crate::{
    actor::Actor,
    desk::ComplaintDesk,
    error::{DeskError, DeskResult},
    status::ComplaintStatus,
    types::{ComplaintId, MunicipalityId, UserId},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateComplaint {
        actor: Actor,
        complaint: String,
        #[serde(rename = "municipalityId")]
        municipality_id: MunicipalityId,
    },
    ListMunicipalities,
    MunicipalityAverageRating {
        id: MunicipalityId,
    },
    MunicipalityProfile {
        actor: Actor,
    },
    ListUserComplaints {
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    ListAllComplaints {
        #[serde(default, rename = "userId")]
        viewer: Option<UserId>,
    },
    ListMunicipalityComplaints {
        actor: Actor,
    },
    ListResolvedComplaints {
        #[serde(rename = "municipalityId")]
        municipality_id: MunicipalityId,
    },
    Support {
        #[serde(rename = "complaintId")]
        complaint_id: ComplaintId,
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    Unsupport {
        #[serde(rename = "complaintId")]
        complaint_id: ComplaintId,
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    ToggleSupport {
        #[serde(rename = "complaintId")]
        complaint_id: ComplaintId,
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    ListUserSupports {
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    UpdateStatus {
        actor: Actor,
        #[serde(rename = "complaintId")]
        complaint_id: ComplaintId,
        status: String,
        #[serde(default)]
        feedback: Option<String>,
    },
    SubmitRating {
        #[serde(rename = "municipalityId")]
        municipality_id: Option<MunicipalityId>,
        #[serde(rename = "userId")]
        user_id: UserId,
        rating: i64,
        #[serde(default)]
        comment: Option<String>,
        #[serde(rename = "complaintId")]
        complaint_id: ComplaintId,
    },
    GetRating {
        #[serde(rename = "municipalityId")]
        municipality_id: Option<MunicipalityId>,
        #[serde(rename = "userId")]
        user_id: UserId,
        #[serde(rename = "complaintId")]
        complaint_id: ComplaintId,
    },
    GetComplaintRating {
        #[serde(rename = "complaintId")]
        complaint_id: ComplaintId,
    },
    DeleteComplaint {
        actor: Actor,
        #[serde(rename = "complaintId")]
        complaint_id: ComplaintId,
    },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn created(body: Value) -> Self {
        Self { status: 201, body }
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl From<DeskError> for Response {
    fn from(e: DeskError) -> Self {
        let status = e.status_code();
        if status >= 500 {
            log::error!("request failed: {e}");
            Response::error(status, "internal error, please retry")
        } else {
            Response::error(status, e.to_string())
        }
    }
}

/// Parse one JSON request and execute it.
pub fn handle_json(desk: &ComplaintDesk, raw: &str) -> Response {
    match serde_json::from_str::<Request>(raw) {
        Ok(request) => handle(desk, request),
        Err(e) => Response::error(400, format!("malformed request: {e}")),
    }
}

pub fn handle(desk: &ComplaintDesk, request: Request) -> Response {
    match dispatch(desk, request) {
        Ok(response) => response,
        Err(e) => e.into(),
    }
}

fn dispatch(desk: &ComplaintDesk, request: Request) -> DeskResult<Response> {
    let response = match request {
        Request::CreateComplaint {
            actor,
            complaint,
            municipality_id,
        } => {
            let created = desk.complaints().create(&actor, municipality_id, &complaint)?;
            Response::created(serde_json::to_value(created)?)
        }
        Request::ListMunicipalities => {
            Response::ok(serde_json::to_value(desk.municipalities().list()?)?)
        }
        Request::MunicipalityAverageRating { id } => {
            Response::ok(serde_json::to_value(desk.aggregates().get(id)?)?)
        }
        Request::MunicipalityProfile { actor } => {
            let id = actor.municipality()?;
            let profile = crate::municipality_registry::MunicipalityProfile {
                municipality: desk.municipalities().get(id)?,
                rating: desk.aggregates().get(id)?,
            };
            Response::ok(serde_json::to_value(profile)?)
        }
        Request::ListUserComplaints { user_id } => {
            Response::ok(serde_json::to_value(desk.complaints().list_by_author(user_id)?)?)
        }
        Request::ListAllComplaints { viewer } => {
            Response::ok(serde_json::to_value(desk.complaints().list_all(viewer)?)?)
        }
        Request::ListMunicipalityComplaints { actor } => {
            Response::ok(serde_json::to_value(desk.complaints().list_by_municipality(&actor)?)?)
        }
        Request::ListResolvedComplaints { municipality_id } => Response::ok(serde_json::to_value(
            desk.complaints().list_resolved_by_municipality(municipality_id)?,
        )?),
        Request::Support { complaint_id, user_id } => {
            let state = desk
                .supports()
                .set_support(complaint_id, &Actor::Citizen(user_id), true)?;
            Response::ok(serde_json::to_value(state)?)
        }
        Request::Unsupport { complaint_id, user_id } => {
            let state = desk
                .supports()
                .set_support(complaint_id, &Actor::Citizen(user_id), false)?;
            Response::ok(serde_json::to_value(state)?)
        }
        Request::ToggleSupport { complaint_id, user_id } => {
            let state = desk.supports().toggle(complaint_id, &Actor::Citizen(user_id))?;
            Response::ok(serde_json::to_value(state)?)
        }
        Request::ListUserSupports { user_id } => Response::ok(serde_json::to_value(
            desk.supports().list_supported_by_user(user_id)?,
        )?),
        Request::UpdateStatus {
            actor,
            complaint_id,
            status,
            feedback,
        } => {
            let status: ComplaintStatus = status.parse()?;
            let updated = desk.complaints().set_status(
                complaint_id,
                &actor,
                status,
                feedback.as_deref(),
            )?;
            Response::ok(serde_json::to_value(updated)?)
        }
        Request::SubmitRating {
            municipality_id,
            user_id,
            rating,
            comment,
            complaint_id,
        } => {
            if let Some(claimed) = municipality_id {
                let complaint = desk.complaints().get(complaint_id)?;
                if complaint.municipality_id != claimed {
                    return Err(DeskError::Validation(format!(
                        "complaint {complaint_id} was not filed against municipality {claimed}"
                    )));
                }
            }
            let created = desk.ratings().submit(
                complaint_id,
                &Actor::Citizen(user_id),
                rating,
                comment.as_deref(),
            )?;
            Response::ok(serde_json::to_value(created)?)
        }
        Request::GetRating {
            municipality_id,
            user_id,
            complaint_id,
        } => {
            let rating = desk
                .ratings()
                .get(complaint_id, user_id)?
                .filter(|r| municipality_id.map_or(true, |m| r.municipality_id == m));
            Response::ok(serde_json::to_value(rating)?)
        }
        Request::GetComplaintRating { complaint_id } => {
            match desk.ratings().get_by_complaint(complaint_id)? {
                Some(rating) => Response::ok(serde_json::to_value(rating)?),
                None => Response::ok(json!({})),
            }
        }
        Request::DeleteComplaint { actor, complaint_id } => {
            desk.complaints().delete(complaint_id, &actor)?;
            Response::ok(json!({ "deleted": complaint_id }))
        }
    };
    Ok(response)
}
