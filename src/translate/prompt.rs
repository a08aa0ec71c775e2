use crate::config::LanguagePolicy;

/// Build the instruction prompt wrapping one SRT file
pub fn build_prompt(srt: &str, policy: &LanguagePolicy) -> String {
    format!(
        "You are an expert subtitle translator.\n\
         Translate the following SRT file content from {source} to {target}.\n\
         IMPORTANT: Do not translate or modify the sequence numbers, the timestamps, \
         or any SRT formatting tags such as <i>, <b>, etc.\n\
         Translate only the dialogue lines. Keep the SRT file structure intact.\n\
         \n\
         SRT content to translate:\n\
         ---\n\
         {srt}\n\
         ---\n",
        source = policy.source_name,
        target = policy.target_name,
        srt = srt.trim_end(),
    )
}
