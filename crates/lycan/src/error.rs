//! One error type for applications built on Lycan.

use lycan_game::{CommandError, DirectoryError, GameError, StoryError};
use lycan_protocol::ProtocolError;
use lycan_transport::TransportError;

/// Wraps the error enum of every layer so that `?` works across them.
#[derive(Debug, thiserror::Error)]
pub enum LycanError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session operation failed (not enough players, stopped actor).
    #[error(transparent)]
    Game(#[from] GameError),

    /// A lobby operation failed.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Story(#[from] StoryError),
}

impl LycanError {
    /// HTTP-like status reported to clients in `ServerFrame::Error`.
    pub fn code(&self) -> u16 {
        match self {
            Self::Transport(_) => 500,
            Self::Protocol(_) | Self::Command(_) => 400,
            Self::Story(_) => 500,
            Self::Game(e) => game_code(e),
            Self::Directory(e) => match e {
                DirectoryError::NotFound(_) => 404,
                DirectoryError::NameTaken(_)
                | DirectoryError::AlreadyInGame(..)
                | DirectoryError::NotJoinable(_) => 409,
                DirectoryError::NotAdmin(_) => 403,
                DirectoryError::NotInGame(_) | DirectoryError::CannotKickSelf => 400,
                DirectoryError::Game(e) => game_code(e),
            },
        }
    }
}

fn game_code(err: &GameError) -> u16 {
    match err {
        GameError::NotEnoughPlayers { .. } | GameError::AlreadyJoined(_) => 409,
        GameError::UnknownParticipant(_) => 404,
        GameError::InvalidState(_) => 400,
        GameError::Unavailable(_) => 503,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lycan_protocol::ParticipantId;

    #[test]
    fn test_from_transport_error() {
        let err: LycanError = TransportError::ConnectionClosed("gone".into()).into();
        assert!(matches!(err, LycanError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: LycanError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, LycanError::Protocol(_)));
        assert_eq!(err.code(), 400);
    }

    #[test]
    fn test_from_directory_error_keeps_message() {
        let err: LycanError = DirectoryError::NameTaken("moonlit".into()).into();
        assert_eq!(err.to_string(), "a game called moonlit already exists");
        assert_eq!(err.code(), 409);
    }

    #[test]
    fn test_codes_follow_http_conventions() {
        let not_found: LycanError = DirectoryError::NotFound("x".into()).into();
        let not_admin: LycanError = DirectoryError::NotAdmin("x".into()).into();
        let too_few: LycanError =
            DirectoryError::Game(GameError::NotEnoughPlayers { have: 2, need: 4 }).into();
        let gone: LycanError = GameError::Unavailable("x".into()).into();
        let outsider: LycanError = GameError::UnknownParticipant(ParticipantId(3)).into();

        assert_eq!(not_found.code(), 404);
        assert_eq!(not_admin.code(), 403);
        assert_eq!(too_few.code(), 409);
        assert_eq!(gone.code(), 503);
        assert_eq!(outsider.code(), 404);
    }

    #[test]
    fn test_from_command_and_story_errors() {
        let err: LycanError = CommandError::NoSuchPlayer("Zed".into()).into();
        assert!(matches!(err, LycanError::Command(_)));
        let err: LycanError = StoryError::Parse("eof".into()).into();
        assert!(matches!(err, LycanError::Story(_)));
        assert_eq!(err.code(), 500);
    }
}
