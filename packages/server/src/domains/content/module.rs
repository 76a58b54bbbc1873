use std::collections::{btree_map, BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use ledger::{Accepted, HandlerError, Module};
use tracing::debug;
use url::Url;

use crate::common::{Command, Query, QueryResult};
use crate::kernel::BaseMarkdownRenderer;

use super::commands::{
    DisableSubscriptions, EnableSubscriptions, PostComment, PostLink, SetSubmissionPreview,
    UpvoteSubmission,
};
use super::models::{
    canonical_scopes, Comment, Submission, SubmissionPreview, SubscriptionSettings, TreeId, Vote,
    SCOPE_REPLIES, SCOPE_SUBMISSIONS,
};
use super::ranking::{Ranking, FRONTPAGE_SIZE};
use super::ContentError;

const MIN_COMMENT_CHARS: usize = 3;
const MAX_COMMENT_CHARS: usize = 300;

type Result<T> = std::result::Result<T, ContentError>;

/// Submissions, comments, votes and subscription settings, folded from the log.
pub struct Content {
    markdown: Arc<dyn BaseMarkdownRenderer>,
    submissions: HashMap<String, Submission>,
    /// Votes per item id, keyed by voter. Votes may arrive before the item itself.
    votes: HashMap<String, BTreeMap<String, Vote>>,
    subscriptions: HashMap<String, SubscriptionSettings>,
    ranking: Mutex<Ranking>,
}

impl Content {
    pub fn new(markdown: Arc<dyn BaseMarkdownRenderer>) -> Self {
        Self {
            markdown,
            submissions: HashMap::new(),
            votes: HashMap::new(),
            subscriptions: HashMap::new(),
            ranking: Mutex::new(Ranking::new()),
        }
    }

    fn invalidate_ranking(&mut self) {
        self.ranking
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .invalidate();
    }

    // =========================================================================
    // Commands
    // =========================================================================

    fn post_link(&mut self, post: &PostLink) -> Result<()> {
        if post.title.trim().is_empty() {
            return Err(ContentError::EmptyTitle);
        }
        if post.url.trim().is_empty() {
            return Err(ContentError::EmptyUrl);
        }
        let url = Url::parse(&post.url).map_err(|_| ContentError::MalformedUrl(post.url.clone()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ContentError::MalformedUrl(post.url.clone()));
        }
        if post.item_id.is_empty() {
            return Err(ContentError::MissingItemId);
        }
        if post.item_id.contains(TreeId::SEPARATOR) {
            return Err(ContentError::InvalidItemId(post.item_id.clone()));
        }
        if self.submissions.contains_key(&post.item_id) {
            return Err(ContentError::DuplicateItemId(post.item_id.clone()));
        }

        let vote_count = self.votes.get(&post.item_id).map_or(0, BTreeMap::len);
        self.submissions.insert(
            post.item_id.clone(),
            Submission {
                item_id: post.item_id.clone(),
                submitter: post.submitter.clone(),
                url: post.url.clone(),
                title: post.title.clone(),
                submitted_at: post.submitted_at,
                preview: None,
                hidden: false,
                vote_count,
                score: 0.0,
                comment_count: 0,
                comments: Vec::new(),
                viewer_has_voted: false,
            },
        );
        self.invalidate_ranking();
        Ok(())
    }

    fn post_comment(&mut self, comment: &PostComment) -> Result<()> {
        let length = comment.content.chars().count();
        if length > MAX_COMMENT_CHARS {
            return Err(ContentError::CommentTooLong);
        }
        if length < MIN_COMMENT_CHARS {
            return Err(ContentError::CommentTooShort);
        }

        let html = self.markdown.render(&comment.content);
        let indices = comment.parent.indices().ok_or(ContentError::UncommentableItem)?;
        let submission = self
            .submissions
            .get_mut(comment.parent.item_id())
            .ok_or(ContentError::UncommentableItem)?;
        let siblings = children_mut(&mut submission.comments, &indices).ok_or(ContentError::UncommentableItem)?;

        let path = comment.parent.child(siblings.len());
        debug!(path = %path, author = %comment.author, "comment posted");
        siblings.push(Comment {
            path,
            content: comment.content.clone(),
            html,
            author: comment.author.clone(),
            posted_at: comment.posted_at,
            hidden: false,
            children: Vec::new(),
        });
        submission.comment_count += 1;

        self.invalidate_ranking();
        Ok(())
    }

    fn upvote(&mut self, vote: &UpvoteSubmission) -> Result<()> {
        if vote.item_id.is_empty() {
            return Err(ContentError::MissingItemId);
        }
        if vote.voter.is_empty() {
            return Err(ContentError::MissingVoter);
        }

        let voters = self.votes.entry(vote.item_id.clone()).or_default();
        match voters.entry(vote.voter.clone()) {
            btree_map::Entry::Occupied(_) => return Err(ContentError::AlreadyVoted),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(Vote {
                    by: vote.voter.clone(),
                    item_id: vote.item_id.clone(),
                    at: vote.voted_at,
                });
            }
        }
        let count = voters.len();

        if let Some(submission) = self.submissions.get_mut(&vote.item_id) {
            submission.vote_count = count;
        }
        self.invalidate_ranking();
        Ok(())
    }

    fn set_submission_hidden(&mut self, item_id: &str, hidden: bool) -> Result<()> {
        let submission = self
            .submissions
            .get_mut(item_id)
            .ok_or_else(|| ContentError::ItemNotFound(item_id.to_string()))?;
        submission.hidden = hidden;
        Ok(())
    }

    fn set_comment_hidden(&mut self, id: &TreeId, hidden: bool) -> Result<()> {
        let comment = self
            .comment_mut(id)
            .ok_or_else(|| ContentError::ItemNotFound(id.to_string()))?;
        comment.hidden = hidden;
        Ok(())
    }

    fn set_preview(&mut self, preview: &SetSubmissionPreview) -> Result<()> {
        let submission = self
            .submissions
            .get_mut(&preview.item_id)
            .ok_or_else(|| ContentError::ItemNotFound(preview.item_id.clone()))?;
        submission.preview = Some(SubmissionPreview {
            title: preview.extracted_title.clone(),
            image_url: preview.image_url.clone(),
            metadata: preview.metadata.clone(),
        });
        Ok(())
    }

    fn enable_subscriptions(&mut self, request: &EnableSubscriptions) -> Result<EnableSubscriptions> {
        let scopes = canonical_scopes(&request.scopes)?;
        self.subscriptions
            .entry(request.username.clone())
            .or_insert_with(|| SubscriptionSettings::defaults_for(&request.username))
            .enable(&scopes, request.enabled_at);

        Ok(EnableSubscriptions {
            scopes,
            ..request.clone()
        })
    }

    fn disable_subscriptions(&mut self, request: &DisableSubscriptions) -> Result<DisableSubscriptions> {
        let scopes = canonical_scopes(&request.scopes)?;
        self.subscriptions
            .entry(request.username.clone())
            .or_insert_with(|| SubscriptionSettings::defaults_for(&request.username))
            .disable(&scopes, request.disabled_at);

        Ok(DisableSubscriptions {
            scopes,
            ..request.clone()
        })
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    fn comment_mut(&mut self, id: &TreeId) -> Option<&mut Comment> {
        let indices = id.indices()?;
        let (last, path) = indices.split_last()?;
        let submission = self.submissions.get_mut(id.item_id())?;
        children_mut(&mut submission.comments, path)?.get_mut(*last)
    }

    fn comment(&self, id: &TreeId) -> Option<&Comment> {
        let indices = id.indices()?;
        let (first, rest) = indices.split_first()?;
        let mut comment = self.submissions.get(id.item_id())?.comments.get(*first)?;
        for index in rest {
            comment = comment.children.get(*index)?;
        }
        Some(comment)
    }

    fn has_voted(&self, item_id: &str, viewer: Option<&str>) -> bool {
        viewer
            .and_then(|viewer| self.votes.get(item_id).map(|voters| voters.contains_key(viewer)))
            .unwrap_or(false)
    }

    fn view(&self, submission: &Submission, score: f64, viewer: Option<&str>) -> Submission {
        Submission {
            score,
            viewer_has_voted: self.has_voted(&submission.item_id, viewer),
            ..submission.clone()
        }
    }

    fn subscribed(&self, username: &str, scope: &str) -> bool {
        self.subscriptions
            .get(username)
            .map_or(false, |settings| settings.is_enabled(scope))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    fn find_submission(&self, item_id: &str, viewer: Option<&str>) -> Result<Submission> {
        let submission = self
            .submissions
            .get(item_id)
            .ok_or_else(|| ContentError::ItemNotFound(item_id.to_string()))?;

        let mut ranking = self.ranking.lock().unwrap_or_else(PoisonError::into_inner);
        ranking.refresh(self.submissions.values());
        Ok(self.view(submission, ranking.score_of(item_id), viewer))
    }

    fn frontpage(&self, viewer: Option<&str>, after: usize) -> Vec<Submission> {
        let mut ranking = self.ranking.lock().unwrap_or_else(PoisonError::into_inner);
        ranking.refresh(self.submissions.values());

        ranking
            .order()
            .iter()
            .filter_map(|item_id| self.submissions.get(item_id))
            .filter(|submission| !submission.hidden)
            .skip(after)
            .take(FRONTPAGE_SIZE)
            .map(|submission| self.view(submission, ranking.score_of(&submission.item_id), viewer))
            .collect()
    }

    fn subscribers_for_new_submission(&self) -> Vec<String> {
        let subscribers: BTreeSet<&String> = self
            .subscriptions
            .iter()
            .filter(|(_, settings)| settings.is_enabled(SCOPE_SUBMISSIONS))
            .map(|(username, _)| username)
            .collect();
        subscribers.into_iter().cloned().collect()
    }

    /// The submitter and everyone who commented anywhere in the thread,
    /// limited to users who enabled replies.
    fn subscribers_for_new_comment(&self, parent: &TreeId) -> Vec<String> {
        let Some(submission) = self.submissions.get(parent.item_id()) else {
            return Vec::new();
        };

        let participants: BTreeSet<&str> = std::iter::once(submission.submitter.as_str())
            .chain(submission.all_comments().map(|comment| comment.author.as_str()))
            .filter(|username| self.subscribed(username, SCOPE_REPLIES))
            .collect();
        participants.into_iter().map(str::to_string).collect()
    }
}

/// The sibling list under `indices`, walking down from the submission's
/// top-level comments.
fn children_mut<'a>(comments: &'a mut Vec<Comment>, indices: &[usize]) -> Option<&'a mut Vec<Comment>> {
    let mut children = comments;
    for index in indices {
        children = &mut children.get_mut(*index)?.children;
    }
    Some(children)
}

impl Module<Command, Query, QueryResult> for Content {
    fn name(&self) -> &'static str {
        "content"
    }

    fn handle_command(&mut self, command: &Command) -> std::result::Result<Accepted<Command>, HandlerError> {
        match command {
            Command::PostLink(post) => self.post_link(post)?,
            Command::PostComment(comment) => self.post_comment(comment)?,
            Command::UpvoteSubmission(vote) => self.upvote(vote)?,
            Command::HideSubmission(hide) => self.set_submission_hidden(&hide.item_id, true)?,
            Command::UnhideSubmission(unhide) => self.set_submission_hidden(&unhide.item_id, false)?,
            Command::HideComment(hide) => self.set_comment_hidden(&hide.comment_id, true)?,
            Command::UnhideComment(unhide) => self.set_comment_hidden(&unhide.comment_id, false)?,
            Command::SetSubmissionPreview(preview) => self.set_preview(preview)?,
            Command::EnableSubscriptions(request) => {
                let canonical = self.enable_subscriptions(request)?;
                return Ok(Accepted::Canonical(canonical.into()));
            }
            Command::DisableSubscriptions(request) => {
                let canonical = self.disable_subscriptions(request)?;
                return Ok(Accepted::Canonical(canonical.into()));
            }
            // Read by the notifier
            Command::SetNotifierConfig(_) => {}
            _ => return Err(HandlerError::NotAccepted),
        }
        Ok(Accepted::AsIs)
    }

    fn handle_query(&self, query: &Query) -> std::result::Result<QueryResult, HandlerError> {
        let result = match query {
            Query::FindSubmission(find) => {
                QueryResult::Submission(self.find_submission(&find.item_id, find.viewer.as_deref())?)
            }
            Query::GetFrontpage(page) => QueryResult::Submissions(self.frontpage(page.viewer.as_deref(), page.after)),
            Query::FindComment(find) => QueryResult::Comment(
                self.comment(&find.id)
                    .cloned()
                    .ok_or_else(|| ContentError::ItemNotFound(find.id.to_string()))?,
            ),
            Query::FindSubscribersForNewSubmission(_) => {
                QueryResult::Subscribers(self.subscribers_for_new_submission())
            }
            Query::FindSubscribersForNewComment(find) => {
                QueryResult::Subscribers(self.subscribers_for_new_comment(&find.parent))
            }
            Query::MySubscriptionSettings(mine) => QueryResult::SubscriptionSettings(
                self.subscriptions
                    .get(&mine.username)
                    .cloned()
                    .unwrap_or_else(|| SubscriptionSettings::defaults_for(&mine.username)),
            ),
            _ => return Err(HandlerError::NotAccepted),
        };
        Ok(result)
    }
}
