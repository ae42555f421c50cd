pub mod candidate_source;
pub mod color_identity;
pub mod combo_extractor;
pub mod commander_advisor;
pub mod land_base;
pub mod response_parser;
pub mod validator;
pub mod voting_agent;

pub use candidate_source::{CandidatePool, CandidateSource};
pub use color_identity::ColorIdentityResolver;
pub use combo_extractor::ComboExtractor;
pub use commander_advisor::CommanderAdvisor;
pub use land_base::LandBaseFiller;
pub use response_parser::ResponseParser;
pub use validator::{ValidationReport, Validator};
pub use voting_agent::{AgentRoster, AgentVerdict, Personality, VotingAgent};
