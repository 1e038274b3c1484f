pub mod challenge;
pub mod challenge_completion;
pub mod challenge_participant;
pub mod course_enrollment;
pub mod institution;
pub mod institution_course;
pub mod institution_material;
pub mod institution_question;
pub mod institution_video;
pub mod user;
