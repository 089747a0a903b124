//! Documents persisted by the stores, plus their input and patch shapes.

mod event;
mod forum;
mod post;
mod school;
mod topic;

pub use event::{
    AgendaItem, Attendee, AttendeePatch, AttendeeStatus, Audience, Event, EventLocation, EventPatch,
    EventQuery, EventStatus, EventType, NewEvent, PaymentStatus, RegistrationFee, Sponsor, Visibility,
};
pub use forum::{forum_order, Forum, ForumPatch, ForumScope, NewForum};
pub use post::{Post, Report, ReportAction, ReportStatus};
pub use school::{
    Coordinates, Gender, NewSchool, Region, School, SchoolLocation, SchoolPatch, SchoolType,
};
pub use topic::{NewTopic, Topic, TopicPatch, TopicSort};
