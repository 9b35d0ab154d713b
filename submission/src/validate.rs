use serenity_core::DurationSeconds;
use serenity_core::FieldErrors;
use serenity_core::ScriptType;
use serenity_core::UserId;
use serenity_core::Visibility;

/// Validated shape of a submission. Construction doesn't enforce the
/// invariants below — call [`SubmissionRequest::validate`] before use, the
/// way [`SubmissionService::submit`](crate::SubmissionService::submit) does.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub user_id: UserId,
    pub visual_prompt: String,
    pub script_type: ScriptType,
    pub script_content: Option<String>,
    pub duration_seconds: DurationSeconds,
    pub ambient_sound_id: Option<uuid::Uuid>,
    pub music_track_id: Option<uuid::Uuid>,
    pub visibility: Visibility,
}

impl SubmissionRequest {
    /// Spec §4.4 step 1 / §6 schema / invariant G1.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        let prompt_len = self.visual_prompt.chars().count();
        if prompt_len == 0 || prompt_len > 1000 {
            errors.add(
                "visualPrompt",
                "must be between 1 and 1000 characters",
            );
        }

        if self.script_type.requires_script_content() {
            let has_content = self
                .script_content
                .as_ref()
                .is_some_and(|s| !s.trim().is_empty());
            if !has_content {
                errors.add(
                    "scriptContent",
                    "required when scriptType is user_provided or template",
                );
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_request() -> SubmissionRequest {
        SubmissionRequest {
            user_id: UserId::new(),
            visual_prompt: "A peaceful mountain scene".to_string(),
            script_type: ScriptType::AiGenerated,
            script_content: None,
            duration_seconds: DurationSeconds::Sixty,
            ambient_sound_id: None,
            music_track_id: None,
            visibility: Visibility::Public,
        }
    }

    #[test]
    fn ai_generated_does_not_require_script_content() {
        assert!(base_request().validate().is_ok());
    }

    #[test]
    fn empty_prompt_is_rejected() {
        let mut request = base_request();
        request.visual_prompt = String::new();
        let errors = request.validate().expect_err("should fail");
        assert!(errors.0.contains_key("visualPrompt"));
    }

    #[test]
    fn prompt_over_1000_chars_is_rejected() {
        let mut request = base_request();
        request.visual_prompt = "a".repeat(1001);
        let errors = request.validate().expect_err("should fail");
        assert!(errors.0.contains_key("visualPrompt"));
    }

    #[test]
    fn user_provided_without_script_content_is_rejected() {
        let mut request = base_request();
        request.script_type = ScriptType::UserProvided;
        request.script_content = None;
        let errors = request.validate().expect_err("should fail");
        assert!(errors.0.contains_key("scriptContent"));
    }

    #[test]
    fn user_provided_with_script_content_is_accepted() {
        let mut request = base_request();
        request.script_type = ScriptType::UserProvided;
        request.script_content = Some("breathe in, breathe out".to_string());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn template_with_blank_script_content_is_rejected() {
        let mut request = base_request();
        request.script_type = ScriptType::Template;
        request.script_content = Some("   ".to_string());
        let errors = request.validate().expect_err("should fail");
        assert!(errors.0.contains_key("scriptContent"));
    }
}
