//! Builds provider-ready post payloads from projected fields.
//!
//! Both writing adapters share this: the title/body assembly, the provenance
//! header, and inline comment rendering are identical across providers, only
//! the wire format differs. Required fields missing from a projection are a
//! hard error here, before any remote call goes out.

use crate::error::{Error, Result};
use crate::forge::Comment;
use crate::projection::{Field, FieldMap, FieldMapExt};
use crate::provenance::{self, PostKind};

/// Issue payload, provider-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuePost {
    pub title: String,
    pub body: String,
    pub labels: Option<Vec<String>>,
    pub assignees: Option<Vec<String>>,
    /// Comments to replay after creation, already in creation order.
    /// Empty when `shorten` inlined them into the body.
    pub comments: Vec<Comment>,
}

/// Pull request payload, provider-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct PrPost {
    pub title: String,
    pub body: String,
    pub source_branch: String,
    pub target_branch: String,
    pub labels: Option<Vec<String>>,
}

/// Release payload, provider-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub struct ReleasePost {
    pub tag: String,
    pub title: String,
    pub body: String,
}

fn required(fields: &FieldMap, field: Field) -> Result<&str> {
    fields.text(field).ok_or(Error::MissingField(field))
}

/// Assemble an issue payload.
///
/// `shorten` is the effective mode for this one call: when set, comments are
/// rendered into the body instead of being queued for replay.
pub fn issue_post(fields: &FieldMap, shorten: bool) -> Result<IssuePost> {
    let title = required(fields, Field::Title)?.to_string();
    let author = required(fields, Field::Author)?;

    let mut body = provenance::header(
        PostKind::Issue,
        fields.text(Field::Url),
        fields.text(Field::Created),
        author,
    );
    body.push_str(fields.text(Field::Description).unwrap_or_default());

    let comments = fields.comments().to_vec();
    let comments = if shorten {
        for comment in &comments {
            body.push_str("\n\n");
            body.push_str(&provenance::render_comment(comment));
        }
        Vec::new()
    } else {
        comments
    };

    Ok(IssuePost {
        title,
        body,
        labels: fields.text_list(Field::Labels).map(<[String]>::to_vec),
        assignees: fields.text_list(Field::Assignees).map(<[String]>::to_vec),
        comments,
    })
}

/// Assemble a pull request payload.
///
/// Branch names are required: a real PR cannot be created without them, so a
/// projection gated by `pr.track_branches = false` fails here rather than at
/// the API.
pub fn pr_post(fields: &FieldMap) -> Result<PrPost> {
    let title = required(fields, Field::Title)?.to_string();
    let author = required(fields, Field::Author)?;
    let source_branch = required(fields, Field::SourceBranch)?.to_string();
    let target_branch = required(fields, Field::TargetBranch)?.to_string();

    let mut body = provenance::header(
        PostKind::PullRequest,
        fields.text(Field::Url),
        fields.text(Field::Created),
        author,
    );
    body.push_str(fields.text(Field::Description).unwrap_or_default());

    Ok(PrPost {
        title,
        body,
        source_branch,
        target_branch,
        labels: fields.text_list(Field::Labels).map(<[String]>::to_vec),
    })
}

/// Assemble a release payload.
pub fn release_post(fields: &FieldMap) -> Result<ReleasePost> {
    let tag = required(fields, Field::Tag)?.to_string();
    let title = fields.text(Field::Title).unwrap_or(&tag).to_string();

    let mut body = provenance::header(
        PostKind::Release,
        fields.text(Field::Url),
        fields.text(Field::Created),
        provenance::NOT_TRACKED,
    );
    body.push_str(fields.text(Field::Description).unwrap_or_default());

    Ok(ReleasePost { tag, title, body })
}
