//! Prompt builders
//!
//! One pure function per operation. Every prompt that expects structured
//! output spells out the exact top-level keys and the string-escaping rules,
//! since the model is the only producer of that JSON. Prompts that ask for
//! example or practice code embed the shared difficulty guidance.

use crate::tutor::difficulty::Difficulty;
use crate::tutor::language::Language;
use crate::tutor::types::{PracticeQuestion, ProjectInput};
use serde_json::{json, Value};

/// Upper bound on file content embedded in project prompts
pub const MAX_PROJECT_CHARS: usize = 200_000;

const STEP_SCHEMA: &str = r#"{
      "lineNumber": <1-based line number being executed, or null>,
      "explanation": "<what happens at this step>",
      "variablesState": "<a JSON-encoded STRING of an object mapping every variable in scope to its current value, e.g. \"{\\\"count\\\": 2}\">",
      "consoleOutput": "<text printed by this step including any trailing newline, or null>",
      "pendingInput": {"prompt": "<input prompt shown>", "variableName": "<receiving variable>"} or null
    }"#;

const PRACTICE_SCHEMA: &str = r#"{
      "questionText": "<the problem statement>",
      "instructions": ["<level 1: a general nudge>", "<level 2: more specific guidance>"],
      "solutionCode": "<complete working solution>",
      "solutionOutput": "<exact console output of the solution>"
    }"#;

fn json_contract(keys: &[&str]) -> String {
    format!(
        "OUTPUT RULES:\n\
         - Respond with ONE JSON object and nothing else. No markdown fences, no commentary.\n\
         - The object MUST contain exactly these top-level keys: {}.\n\
         - Never repeat a key within the same object.\n\
         - Inside string values escape newlines as \\n, tabs as \\t and double quotes as \\\". \
         Never emit raw control characters inside strings.",
        keys.iter()
            .map(|k| format!("\"{}\"", k))
            .collect::<Vec<_>>()
            .join(", ")
    )
}

fn language_line(language: Language) -> String {
    if language.is_known() {
        format!("The language is {}.", language.display_name())
    } else {
        "The language is not specified. Identify it yourself and report it in \
         \"detectedLanguage\" as a lowercase name such as \"python\" or \"javascript\"."
            .to_string()
    }
}

fn fence_tag(language: Language) -> &'static str {
    match language {
        Language::Python => "python",
        Language::JavaScript => "javascript",
        Language::TypeScript => "typescript",
        Language::Java => "java",
        Language::C => "c",
        Language::Cpp => "cpp",
        Language::CSharp => "csharp",
        Language::Go => "go",
        Language::Rust => "rust",
        Language::Ruby => "ruby",
        Language::Php => "php",
        Language::Swift => "swift",
        Language::Kotlin => "kotlin",
        Language::Sql => "sql",
        Language::Html => "html",
        Language::Css => "css",
        Language::Bash => "bash",
        Language::Unknown => "",
    }
}

fn fenced(code: &str, language: Language) -> String {
    format!("```{}\n{}\n```", fence_tag(language), code.trim_end())
}

/// Embed project files as fenced blocks, capped at `MAX_PROJECT_CHARS`
pub fn project_listing(project: &ProjectInput) -> String {
    let mut listing = String::new();
    let mut budget = MAX_PROJECT_CHARS;
    let mut omitted = Vec::new();

    for file in &project.files {
        if file.content.len() > budget {
            omitted.push(file.path.as_str());
            continue;
        }
        budget -= file.content.len();
        listing.push_str(&format!(
            "--- FILE: {} ---\n```\n{}\n```\n\n",
            file.path,
            file.content.trim_end()
        ));
    }

    if !omitted.is_empty() {
        listing.push_str(
            "NOTE: the following files were too large to include and are listed by path only:\n",
        );
        for path in omitted {
            listing.push_str(&format!("- {}\n", path));
        }
    }
    listing
}

fn practice_block(question: &PracticeQuestion) -> String {
    let levels = question
        .instructions
        .iter()
        .enumerate()
        .map(|(i, level)| format!("Level {}: {}", i + 1, level))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "PRACTICE QUESTION:\n{}\n\nINSTRUCTIONS ALREADY GIVEN:\n{}",
        question.question_text, levels
    )
}

/// Explain submitted code, with an alternate example and two practice problems
pub fn analyze_code_prompt(code: &str, language: Language, difficulty: Difficulty) -> String {
    format!(
        r#"You are an expert programming tutor. Explain the code below to a learner.
{language_line}

CODE:
{code}

{difficulty}

Produce:
1. "topicExplanation": an object with
   - "coreConcepts": markdown explaining the programming concepts the code uses,
   - "blockByBlockBreakdown": markdown walking through each logical block,
   - "lineByLineBreakdown": markdown explaining every line,
   - "executionFlow": markdown narrating execution order and how data is transformed,
   - "visualExecutionTrace": an ordered array of steps simulating a debugger, each step shaped as
    {step}
2. "exampleCode": a DIFFERENT program in the same language that demonstrates the same concepts. It must not repeat the learner's code.
3. "exampleCodeOutput": the exact console output of "exampleCode".
4. "practiceContext": an object with
   - "generatedPractice": a new practice problem on the same concepts, shaped as
    {practice}
   - "userCodeAsPractice": a practice problem whose reference solution is exactly the learner's code, same shape, with "solutionCode" set to the learner's code verbatim.
5. "detectedLanguage": the language of the learner's code in lowercase.

{contract}"#,
        language_line = language_line(language),
        code = fenced(code, language),
        difficulty = difficulty.prompt_block(),
        step = STEP_SCHEMA,
        practice = PRACTICE_SCHEMA,
        contract = json_contract(&[
            "topicExplanation",
            "exampleCode",
            "exampleCodeOutput",
            "practiceContext",
            "detectedLanguage",
        ]),
    )
}

/// Explain a concept described in prose, in a given language
pub fn analyze_concept_prompt(concept: &str, language: Language, difficulty: Difficulty) -> String {
    format!(
        r#"You are an expert programming tutor. A learner wants to understand this concept:

CONCEPT:
"""
{concept}
"""

Teach it using {language}.

{difficulty}

Produce:
1. "topicExplanation": an object with
   - "coreConcepts": markdown explaining the concept,
   - "blockByBlockBreakdown": markdown walking through each block of "exampleCode",
   - "lineByLineBreakdown": markdown explaining every line of "exampleCode",
   - "executionFlow": markdown narrating how "exampleCode" executes,
   - "visualExecutionTrace": an ordered array of steps tracing "exampleCode", each shaped as
    {step}
2. "exampleCode": a program in {language} demonstrating the concept.
3. "exampleCodeOutput": the exact console output of "exampleCode".
4. "practiceContext": an object with
   - "generatedPractice": a practice problem applying the concept, shaped as
    {practice}
   - "userCodeAsPractice": a second, different practice problem derived directly from the learner's description, same shape.

{contract}"#,
        concept = concept.trim(),
        language = language.display_name(),
        difficulty = difficulty.prompt_block(),
        step = STEP_SCHEMA,
        practice = PRACTICE_SCHEMA,
        contract = json_contract(&[
            "topicExplanation",
            "exampleCode",
            "exampleCodeOutput",
            "practiceContext",
        ]),
    )
}

/// Find and fix the errors in a program
pub fn debug_code_prompt(code: &str, language: Language, problem: Option<&str>) -> String {
    let problem = problem
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("\nTHE LEARNER DESCRIBES THE PROBLEM AS:\n\"\"\"\n{}\n\"\"\"\n", p))
        .unwrap_or_default();
    format!(
        r#"You are an expert debugger helping a learner. Find every syntax, runtime and logic error in the code below.
{language_line}

CODE:
{code}
{problem}
Produce:
1. "summary": a short overview of what is wrong (or a statement that no errors were found).
2. "errors": an array in source order; each item is
   {{"lineNumber": <1-based line or null>, "errorLine": "<the offending line or snippet>", "errorType": "<SyntaxError | RuntimeError | LogicError | ...>", "explanation": "<why it is wrong>", "suggestedFix": "<the corrected line or approach>"}}
   Use an empty array when the code has no errors.
3. "correctedCode": the complete corrected program.
4. "detectedLanguage": the language of the code in lowercase.

{contract}"#,
        language_line = language_line(language),
        code = fenced(code, language),
        problem = problem,
        contract = json_contract(&["summary", "errors", "correctedCode", "detectedLanguage"]),
    )
}

/// Overview and per-file descriptions of a project
pub fn project_overview_prompt(project: &ProjectInput) -> String {
    format!(
        r#"You are a senior engineer onboarding a learner onto the project "{name}".

PROJECT FILES:
{listing}
Produce:
1. "overview": markdown describing what the project does, its structure and its main flows.
2. "files": an array with one item per file, {{"path": "<file path>", "description": "<what the file is responsible for>"}}.

{contract}"#,
        name = project.name,
        listing = project_listing(project),
        contract = json_contract(&["overview", "files"]),
    )
}

/// README for a project, as markdown
pub fn readme_prompt(project: &ProjectInput) -> String {
    format!(
        r#"Write a README.md for the project "{name}".

PROJECT FILES:
{listing}
Include a title, a short description, features, installation, usage with examples and the project structure.
Respond with the markdown document only."#,
        name = project.name,
        listing = project_listing(project),
    )
}

/// External dependencies of a project
pub fn dependencies_prompt(project: &ProjectInput) -> String {
    format!(
        r#"List the external libraries and packages the project "{name}" depends on, based on its manifests and imports.

PROJECT FILES:
{listing}
Produce "dependencies": an array of {{"name": "<package name>", "description": "<what the project uses it for>"}}. Exclude the language's standard library. Use an empty array when there are none.

{contract}"#,
        name = project.name,
        listing = project_listing(project),
        contract = json_contract(&["dependencies"]),
    )
}

/// Module-dependency graph of a project
pub fn architecture_prompt(project: &ProjectInput) -> String {
    format!(
        r#"Map the internal module structure of the project "{name}".

PROJECT FILES:
{listing}
Produce "modules": an array with one item per source file,
{{"path": "<file path>", "description": "<role of the module>", "imports": ["<paths of project files this module imports>"], "importedBy": ["<paths of project files importing this module>"]}}.
Only reference paths that appear in the project. "imports" and "importedBy" must be consistent with each other.

{contract}"#,
        name = project.name,
        listing = project_listing(project),
        contract = json_contract(&["modules"]),
    )
}

/// Final user turn of a project follow-up conversation
pub fn project_followup_prompt(project: &ProjectInput, question: &str) -> String {
    format!(
        r#"You are answering questions about the project "{name}". Base your answers on these files.

PROJECT FILES:
{listing}
QUESTION:
{question}

Answer in markdown. Reference file paths where relevant."#,
        name = project.name,
        listing = project_listing(project),
        question = question.trim(),
    )
}

/// Final user turn of a follow-up conversation about code or a concept
pub fn followup_prompt(subject: &str, language: Language, question: &str) -> String {
    let language = if language.is_known() {
        format!(" ({})", language.display_name())
    } else {
        String::new()
    };
    format!(
        r#"You are a patient programming tutor. The learner is studying the following{language}:

"""
{subject}
"""

QUESTION:
{question}

Answer in markdown, concisely, with short code snippets where they help."#,
        language = language,
        subject = subject.trim(),
        question = question.trim(),
    )
}

/// Next instruction levels for a practice question
pub fn more_instructions_prompt(
    question: &PracticeQuestion,
    language: Language,
    difficulty: Difficulty,
    count: usize,
) -> String {
    format!(
        r#"A learner is working on a {language} practice question and needs more help.

{practice}

{difficulty}

Write the next {count} instruction level(s). Each level must be more specific than every level already given, moving from hints towards a step-by-step plan, but never contain the full solution code.
Produce "instructions": an array of exactly {count} strings, ordered from least to most specific.

{contract}"#,
        language = language.display_name(),
        practice = practice_block(question),
        difficulty = difficulty.prompt_block(),
        count = count,
        contract = json_contract(&["instructions"]),
    )
}

/// Grade a learner's solution to a practice question
pub fn check_solution_prompt(question: &PracticeQuestion, user_code: &str, language: Language) -> String {
    format!(
        r#"You are grading a learner's solution to a {language} practice question.

{practice}

REFERENCE SOLUTION:
{reference}

LEARNER'S SOLUTION:
{user_code}

Decide whether the learner's solution correctly solves the question. Different approaches are fine as long as the behaviour and output match.
Produce:
1. "isCorrect": true or false.
2. "feedback": markdown explaining the verdict, pointing at specific lines when something is wrong.
3. "suggestions": an array of short improvement suggestions (may be empty).

{contract}"#,
        language = language.display_name(),
        practice = practice_block(question),
        reference = fenced(&question.solution_code, language),
        user_code = fenced(user_code, language),
        contract = json_contract(&["isCorrect", "feedback", "suggestions"]),
    )
}

/// Example program at a given difficulty
pub fn example_prompt(topic: &str, language: Language, difficulty: Difficulty) -> String {
    format!(
        r#"Write a {language} example program illustrating the same concepts as the material below.

MATERIAL:
{topic}

{difficulty}

The example must be a NEW program: do not copy or lightly rename the material.
Produce:
1. "exampleCode": the example program.
2. "exampleCodeOutput": its exact console output.

{contract}"#,
        language = language.display_name(),
        topic = fenced(topic, language),
        difficulty = difficulty.prompt_block(),
        contract = json_contract(&["exampleCode", "exampleCodeOutput"]),
    )
}

/// Practice question at a given difficulty
pub fn practice_question_prompt(topic: &str, language: Language, difficulty: Difficulty) -> String {
    format!(
        r#"Create a {language} practice question that exercises the concepts in the material below.

MATERIAL:
{topic}

{difficulty}

The practice question is shaped as
    {practice}

{contract}"#,
        language = language.display_name(),
        topic = fenced(topic, language),
        difficulty = difficulty.prompt_block(),
        practice = PRACTICE_SCHEMA,
        contract = json_contract(&["questionText", "instructions", "solutionCode", "solutionOutput"]),
    )
}

/// Simulate running a program, consuming the given stdin lines
pub fn execute_simulated_prompt(code: &str, language: Language, inputs: &[String]) -> String {
    let inputs = if inputs.is_empty() {
        "No input is available. If the program asks for input, stop at that step and describe it in \"pendingInput\".".to_string()
    } else {
        let lines = inputs
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{}: {}", i + 1, line))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Standard input, one line per read, in order:\n{}\nIf the program asks for more input than provided, stop at that step and describe it in \"pendingInput\".",
            lines
        )
    };
    format!(
        r#"Act as a {language} interpreter with a step debugger. Simulate running the program below exactly as the real runtime would, including errors.

CODE:
{code}

{inputs}

Produce:
1. "steps": an ordered array of executed steps, each shaped as
    {step}
2. "finalOutput": the complete console output of the run.

{contract}"#,
        language = language.display_name(),
        code = fenced(code, language),
        inputs = inputs,
        step = STEP_SCHEMA,
        contract = json_contract(&["steps", "finalOutput"]),
    )
}

/// Transcribe code from an attached image
pub fn extract_code_prompt() -> String {
    format!(
        r#"The attached image contains source code (a screenshot, photo or handwriting).
Transcribe the code exactly, preserving indentation and line breaks. Do not fix bugs or add code.
Produce:
1. "code": the transcribed source.
2. "detectedLanguage": the programming language in lowercase, or "unknown".

{contract}"#,
        contract = json_contract(&["code", "detectedLanguage"]),
    )
}

/// Response schema for the multi-level-hint bundle
pub fn hints_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "instructions": {"type": "ARRAY", "items": {"type": "STRING"}}
        },
        "required": ["instructions"]
    })
}

/// Response schema for the solution-grading bundle
pub fn solution_feedback_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "isCorrect": {"type": "BOOLEAN"},
            "feedback": {"type": "STRING"},
            "suggestions": {"type": "ARRAY", "items": {"type": "STRING"}}
        },
        "required": ["isCorrect", "feedback"]
    })
}

/// Response schema for the dependency-list bundle
pub fn dependencies_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "dependencies": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": {"type": "STRING"},
                        "description": {"type": "STRING"}
                    },
                    "required": ["name", "description"]
                }
            }
        },
        "required": ["dependencies"]
    })
}

/// Response schema for the image-extraction bundle
pub fn extracted_code_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "code": {"type": "STRING"},
            "detectedLanguage": {"type": "STRING"}
        },
        "required": ["code", "detectedLanguage"]
    })
}
