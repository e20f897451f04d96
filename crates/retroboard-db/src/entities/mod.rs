//! Database entities

pub mod action_item;
pub mod board;
pub mod column_definition;
pub mod feedback;
pub mod team;
pub mod thought;
pub mod user;
pub mod user_team;

pub use action_item::Entity as ActionItem;
pub use board::Entity as Board;
pub use column_definition::Entity as ColumnDefinition;
pub use feedback::Entity as Feedback;
pub use team::Entity as Team;
pub use thought::Entity as Thought;
pub use user::Entity as User;
pub use user_team::Entity as UserTeam;

pub mod prelude {
    pub use super::action_item::Entity as ActionItem;
    pub use super::board::Entity as Board;
    pub use super::column_definition::Entity as ColumnDefinition;
    pub use super::feedback::Entity as Feedback;
    pub use super::team::Entity as Team;
    pub use super::thought::Entity as Thought;
    pub use super::user::Entity as User;
    pub use super::user_team::Entity as UserTeam;
}
