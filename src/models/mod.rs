mod app;
mod audience;
mod blog;
mod bookmark;
mod identity;
mod note;

pub use app::{AppEntry, AppStatus, Comment, CommentId, NewApp};
pub use audience::{NewSubscriber, NewTester, Subscriber, Tester};
pub use blog::{BlogPost, NewBlogPost, PostStatus};
pub use bookmark::{BookmarkFolder, BookmarkLink, NewBookmarkFolder, NewBookmarkLink};
pub use identity::{AdminRole, UserIdentity};
pub use note::{NewNote, Note};
