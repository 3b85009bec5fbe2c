/*!
 * Prompt templates for the text generator.
 *
 * Placeholders use `{name}` syntax and are filled by the builders below.
 */

const SCRIPT_TEMPLATE: &str = "You write engaging, informal and conversational narration for short \
vertical videos of up to 60 seconds (YouTube Shorts, Reels, TikTok). Write a natural, authentic \
narration about '{theme}' in {language}. Use informal expressions, short pauses marked with \
ellipses '...', thoughtful interjections such as 'hmmm' or 'you know' and the occasional \
'haha' so it sounds like a real person talking. Return only the narration text, with no scene \
directions, titles or notes.";

const IMAGE_PROMPT_HEADER: &str = "You write prompts for text-to-image models. Write one concise, \
descriptive and artistic image prompt in English for the subtitle segment below. The image must \
show the scene visually and must not contain or ask for any text, letters or captions.";

const MUSIC_CHOICE_HEADER: &str = "You pick background music for short videos. Using the script, \
the image prompts already generated and the catalogue of available songs, choose the song that \
fits the video best. The catalogue is a JSON array of objects with the keys 'id', 'file', \
'keywords', 'artist' and 'source'.";

/// Prompt for the narration script
pub fn script_prompt(theme: &str, language: &str) -> String {
    SCRIPT_TEMPLATE
        .replace("{theme}", theme.trim())
        .replace("{language}", language.trim())
}

/// Prompt for one slot image.
///
/// `full_subtitles` gives the whole story as context, `previous` lists the
/// prompts already used so the images do not repeat.
pub fn image_prompt(full_subtitles: &str, previous: &[String], segment: &str) -> String {
    let mut prompt = format!("{}\n\nSubtitle context:\n{}\n\n", IMAGE_PROMPT_HEADER, full_subtitles.trim());

    if !previous.is_empty() {
        prompt.push_str("Prompts already used (do not repeat these ideas):\n");
        for (i, p) in previous.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, p.trim()));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "Subtitle segment to illustrate (no text in the image):\n{}\n\nWrite the image prompt now.",
        segment.trim()
    ));
    prompt
}

/// Prompt asking for `{"reasoning": ..., "id": ...}`
pub fn music_choice_prompt(script: &str, image_prompts: &[String], songs_json: &str) -> String {
    format!(
        "{}\n\nScript:\n{}\n\nImage prompts:\n{}\n\nSongs (JSON):\n{}\n\n\
         Answer ONLY with a JSON object of this shape:\n\
         {{ \"reasoning\": \"why this song fits\", \"id\": <id of the chosen song> }}",
        MUSIC_CHOICE_HEADER,
        script.trim(),
        image_prompts.join("\n"),
        songs_json
    )
}
