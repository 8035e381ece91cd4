//! Topic endpoints.
//!
//! GET    /topicos       - paged list, optionally filtered by course name
//! POST   /topicos       - open a topic
//! GET    /topicos/{id}  - topic with author and replies
//! PUT    /topicos/{id}  - change title and message
//! DELETE /topicos/{id}  - remove a topic with its replies

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use serde::Deserialize;

use forum_core::DomainError;
use forum_core::error::FieldViolation;
use forum_core::pagination::{PageRequest, Sort, SortDirection, TopicSortField};
use forum_shared::dto::{TopicForm, UpdateTopicForm};

use crate::middleware::error::{AppError, AppResult};
use crate::services::{CreateTopic, UpdateTopic};
use crate::state::AppState;

/// Route name of a single topic, used to build `Location` headers.
pub const TOPIC_RESOURCE: &str = "topico";

const DEFAULT_PAGE_SIZE: i64 = 1;

/// List parameters.
///
/// `pagina`, `quantidade` and `ordenacao` take precedence over the generic
/// `page`, `size` and `sort`. An `ordenacao` always sorts descending; `sort`
/// is `field[,asc|desc]` and ascending unless told otherwise.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTopicsQuery {
    pub nome_curso: Option<String>,
    pub pagina: Option<i64>,
    pub quantidade: Option<i64>,
    pub ordenacao: Option<String>,
    pub page: Option<i64>,
    pub size: Option<i64>,
    pub sort: Option<String>,
}

impl ListTopicsQuery {
    /// Split into the course filter and a bounds-checked page request,
    /// reporting every bad parameter at once.
    fn into_parts(self) -> Result<(Option<String>, PageRequest), DomainError> {
        let mut violations = Vec::new();

        let sort = match (self.ordenacao.as_deref(), self.sort.as_deref()) {
            (Some(field), _) => field
                .parse::<TopicSortField>()
                .map(Sort::desc)
                .map_err(|e| FieldViolation::new("ordenacao", e)),
            (None, Some(raw)) => parse_sort(raw),
            (None, None) => Ok(Sort::default()),
        }
        .unwrap_or_else(|violation| {
            violations.push(violation);
            Sort::default()
        });

        let page = self.pagina.or(self.page).unwrap_or(0);
        let size = self.quantidade.or(self.size).unwrap_or(DEFAULT_PAGE_SIZE);

        let request = match PageRequest::new(page, size, sort) {
            Ok(request) if violations.is_empty() => request,
            Ok(_) => return Err(DomainError::Validation(violations)),
            Err(DomainError::Validation(more)) => {
                violations.extend(more);
                return Err(DomainError::Validation(violations));
            }
            Err(other) => return Err(other),
        };

        let course_name = self.nome_curso.filter(|name| !name.trim().is_empty());
        Ok((course_name, request))
    }
}

fn parse_sort(raw: &str) -> Result<Sort, FieldViolation> {
    let (field, direction) = match raw.split_once(',') {
        Some((field, direction)) => (field, Some(direction)),
        None => (raw, None),
    };

    let field = field
        .parse::<TopicSortField>()
        .map_err(|e| FieldViolation::new("sort", e))?;
    let direction = match direction {
        Some(direction) => direction.parse::<SortDirection>()?,
        None => SortDirection::Asc,
    };

    Ok(Sort { field, direction })
}

/// GET /topicos
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ListTopicsQuery>,
) -> AppResult<HttpResponse> {
    let (course_name, page) = query.into_inner().into_parts()?;
    let topics = state.topics.list(course_name, page).await?;

    Ok(HttpResponse::Ok().json(topics))
}

/// POST /topicos
pub async fn create(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Json<TopicForm>,
) -> AppResult<HttpResponse> {
    let command = CreateTopic::try_from(form.into_inner()).map_err(AppError::Validation)?;
    let topic = state.topics.create(command).await?;

    let location = req
        .url_for(TOPIC_RESOURCE, [topic.id.to_string()])
        .map_err(|e| AppError::Internal(format!("cannot build topic location: {e}")))?;

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, location.as_str()))
        .json(topic))
}

/// GET /topicos/{id}
pub async fn detail(state: web::Data<AppState>, id: web::Path<i64>) -> AppResult<HttpResponse> {
    match state.topics.detail(id.into_inner()).await? {
        Some(topic) => Ok(HttpResponse::Ok().json(topic)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}

/// PUT /topicos/{id}
pub async fn update(
    state: web::Data<AppState>,
    id: web::Path<i64>,
    form: web::Json<UpdateTopicForm>,
) -> AppResult<HttpResponse> {
    let change = UpdateTopic::try_from(form.into_inner()).map_err(AppError::Validation)?;

    match state.topics.update(id.into_inner(), change).await? {
        Some(topic) => Ok(HttpResponse::Ok().json(topic)),
        None => Ok(HttpResponse::NotFound().finish()),
    }
}

/// DELETE /topicos/{id}
pub async fn delete(state: web::Data<AppState>, id: web::Path<i64>) -> AppResult<HttpResponse> {
    if state.topics.delete(id.into_inner()).await? {
        Ok(HttpResponse::Ok().finish())
    } else {
        Ok(HttpResponse::NotFound().finish())
    }
}
