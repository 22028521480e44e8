//! Response validators
//!
//! Each validator checks one response shape and either passes or names the
//! exact field that is missing or has the wrong type. No partial recovery is
//! attempted here; repairs belong to `normalize`.

use crate::error::AppError;
use serde_json::{Map, Value};
use thiserror::Error;

/// A missing or mistyped field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field '{field}' {problem}")]
pub struct ValidationError {
    /// Dotted path of the field (e.g. `practiceContext.generatedPractice.instructions[0]`)
    pub field: String,
    /// What is wrong with it
    pub problem: String,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::SchemaValidationFailed(err.to_string())
    }
}

/// Result of a validator
pub type Validation = Result<(), ValidationError>;

/// Accept an object, or a single-element array wrapping one.
///
/// An empty array is `EmptyResponse`; anything else that is not an object
/// fails validation.
pub fn unwrap_single_object(value: Value) -> Result<Map<String, Value>, AppError> {
    let value = match value {
        Value::Array(mut items) => match items.len() {
            0 => {
                return Err(AppError::EmptyResponse(
                    "response was an empty array".to_string(),
                ))
            }
            1 => {
                tracing::warn!("Model wrapped its response in a single-element array");
                items.remove(0)
            }
            n => {
                return Err(AppError::SchemaValidationFailed(format!(
                    "expected a single JSON object, found an array of {} elements",
                    n
                )))
            }
        },
        other => other,
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(AppError::SchemaValidationFailed(format!(
            "expected a JSON object at the top level, found {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Typed accessors over one JSON object, tracking the path for messages
struct Fields<'a> {
    obj: &'a Map<String, Value>,
    path: String,
}

impl<'a> Fields<'a> {
    fn root(obj: &'a Map<String, Value>) -> Self {
        Self {
            obj,
            path: String::new(),
        }
    }

    fn path_of(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn fail(field: String, problem: impl Into<String>) -> ValidationError {
        ValidationError {
            field,
            problem: problem.into(),
        }
    }

    fn required(&self, key: &str) -> Result<&'a Value, ValidationError> {
        match self.obj.get(key) {
            Some(value) if !value.is_null() => Ok(value),
            _ => Err(Self::fail(self.path_of(key), "is missing")),
        }
    }

    fn string(&self, key: &str) -> Result<&'a str, ValidationError> {
        let value = self.required(key)?;
        value.as_str().ok_or_else(|| {
            Self::fail(
                self.path_of(key),
                format!("must be a string, found {}", type_name(value)),
            )
        })
    }

    fn non_empty_string(&self, key: &str) -> Result<&'a str, ValidationError> {
        let s = self.string(key)?;
        if s.trim().is_empty() {
            return Err(Self::fail(self.path_of(key), "must not be empty"));
        }
        Ok(s)
    }

    fn optional_string(&self, key: &str) -> Result<Option<&'a str>, ValidationError> {
        match self.obj.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(Self::fail(
                self.path_of(key),
                format!("must be a string or null, found {}", type_name(other)),
            )),
        }
    }

    fn boolean(&self, key: &str) -> Result<bool, ValidationError> {
        let value = self.required(key)?;
        value.as_bool().ok_or_else(|| {
            Self::fail(
                self.path_of(key),
                format!("must be a boolean, found {}", type_name(value)),
            )
        })
    }

    fn object(&self, key: &str) -> Result<Fields<'a>, ValidationError> {
        let value = self.required(key)?;
        match value {
            Value::Object(obj) => Ok(Fields {
                obj,
                path: self.path_of(key),
            }),
            other => Err(Self::fail(
                self.path_of(key),
                format!("must be an object, found {}", type_name(other)),
            )),
        }
    }

    fn array(&self, key: &str) -> Result<&'a Vec<Value>, ValidationError> {
        let value = self.required(key)?;
        value.as_array().ok_or_else(|| {
            Self::fail(
                self.path_of(key),
                format!("must be an array, found {}", type_name(value)),
            )
        })
    }

    fn objects(&self, key: &str) -> Result<Vec<Fields<'a>>, ValidationError> {
        self.array(key)?
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let path = format!("{}[{}]", self.path_of(key), i);
                match item {
                    Value::Object(obj) => Ok(Fields { obj, path }),
                    other => Err(Self::fail(
                        path,
                        format!("must be an object, found {}", type_name(other)),
                    )),
                }
            })
            .collect()
    }

    fn strings(&self, key: &str) -> Result<Vec<&'a str>, ValidationError> {
        self.array(key)?
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str().ok_or_else(|| {
                    Self::fail(
                        format!("{}[{}]", self.path_of(key), i),
                        format!("must be a string, found {}", type_name(item)),
                    )
                })
            })
            .collect()
    }

    /// A list of strings with no blank entries
    fn non_empty_strings(&self, key: &str) -> Result<Vec<&'a str>, ValidationError> {
        let items = self.strings(key)?;
        if let Some(i) = items.iter().position(|item| item.trim().is_empty()) {
            return Err(Self::fail(
                format!("{}[{}]", self.path_of(key), i),
                "must not be empty",
            ));
        }
        Ok(items)
    }

    fn optional_strings(&self, key: &str) -> Validation {
        match self.obj.get(key) {
            None | Some(Value::Null) => Ok(()),
            Some(_) => self.strings(key).map(|_| ()),
        }
    }

    fn optional_line_number(&self, key: &str) -> Validation {
        match self.obj.get(key) {
            None | Some(Value::Null) => Ok(()),
            Some(value) => match value.as_u64() {
                Some(n) if n <= u32::MAX as u64 => Ok(()),
                _ => Err(Self::fail(
                    self.path_of(key),
                    "must be a non-negative integer or null",
                )),
            },
        }
    }
}

fn check_practice(practice: &Fields<'_>) -> Validation {
    practice.non_empty_string("questionText")?;
    let instructions = practice.non_empty_strings("instructions")?;
    if instructions.is_empty() {
        return Err(Fields::fail(
            practice.path_of("instructions"),
            "must contain at least one instruction level",
        ));
    }
    practice.non_empty_string("solutionCode")?;
    practice.string("solutionOutput")?;
    Ok(())
}

fn check_step(step: &Fields<'_>) -> Validation {
    step.optional_line_number("lineNumber")?;
    step.string("explanation")?;
    match step.obj.get("variablesState") {
        Some(Value::String(_)) | Some(Value::Object(_)) => {}
        Some(other) if !other.is_null() => {
            return Err(Fields::fail(
                step.path_of("variablesState"),
                format!(
                    "must be a JSON-encoded object string, found {}",
                    type_name(other)
                ),
            ))
        }
        _ => return Err(Fields::fail(step.path_of("variablesState"), "is missing")),
    }
    step.optional_string("consoleOutput")?;
    match step.obj.get("pendingInput") {
        None | Some(Value::Null) => {}
        Some(_) => {
            let pending = step.object("pendingInput")?;
            pending.string("prompt")?;
            pending.optional_string("variableName")?;
        }
    }
    Ok(())
}

fn check_steps(fields: &Fields<'_>, key: &str) -> Validation {
    for step in fields.objects(key)? {
        check_step(&step)?;
    }
    Ok(())
}

/// Topic explanation + example + practice bundle
pub fn validate_analysis(obj: &Map<String, Value>) -> Validation {
    let root = Fields::root(obj);

    let topic = root.object("topicExplanation")?;
    topic.string("coreConcepts")?;
    topic.string("blockByBlockBreakdown")?;
    topic.string("lineByLineBreakdown")?;
    topic.string("executionFlow")?;
    check_steps(&topic, "visualExecutionTrace")?;

    root.non_empty_string("exampleCode")?;
    root.string("exampleCodeOutput")?;

    let practice = root.object("practiceContext")?;
    check_practice(&practice.object("generatedPractice")?)?;
    check_practice(&practice.object("userCodeAsPractice")?)?;

    root.optional_string("detectedLanguage")?;
    Ok(())
}

/// A single practice question
pub fn validate_practice_question(obj: &Map<String, Value>) -> Validation {
    check_practice(&Fields::root(obj))
}

/// Solution-grading bundle
pub fn validate_solution_feedback(obj: &Map<String, Value>) -> Validation {
    let root = Fields::root(obj);
    root.boolean("isCorrect")?;
    root.string("feedback")?;
    root.optional_strings("suggestions")?;
    Ok(())
}

/// Debug-result bundle
pub fn validate_debug(obj: &Map<String, Value>) -> Validation {
    let root = Fields::root(obj);
    root.string("summary")?;
    for finding in root.objects("errors")? {
        finding.optional_line_number("lineNumber")?;
        finding.string("errorLine")?;
        finding.string("errorType")?;
        finding.string("explanation")?;
        finding.string("suggestedFix")?;
    }
    root.non_empty_string("correctedCode")?;
    root.optional_string("detectedLanguage")?;
    Ok(())
}

/// Project-overview bundle
pub fn validate_project_overview(obj: &Map<String, Value>) -> Validation {
    let root = Fields::root(obj);
    root.non_empty_string("overview")?;
    for file in root.objects("files")? {
        file.string("path")?;
        file.string("description")?;
    }
    Ok(())
}

/// Dependency-list bundle
pub fn validate_dependencies(obj: &Map<String, Value>) -> Validation {
    let root = Fields::root(obj);
    for dependency in root.objects("dependencies")? {
        dependency.non_empty_string("name")?;
        dependency.string("description")?;
    }
    Ok(())
}

/// Module-graph bundle
pub fn validate_module_graph(obj: &Map<String, Value>) -> Validation {
    let root = Fields::root(obj);
    for module in root.objects("modules")? {
        module.non_empty_string("path")?;
        module.string("description")?;
        module.strings("imports")?;
        module.strings("importedBy")?;
    }
    Ok(())
}

/// Multi-level-hint bundle
pub fn validate_hints(obj: &Map<String, Value>) -> Validation {
    let root = Fields::root(obj);
    let levels = root.non_empty_strings("instructions")?;
    if levels.is_empty() {
        return Err(Fields::fail(
            "instructions".to_string(),
            "must contain at least one instruction level",
        ));
    }
    Ok(())
}

/// Example-by-difficulty bundle
pub fn validate_example(obj: &Map<String, Value>) -> Validation {
    let root = Fields::root(obj);
    root.non_empty_string("exampleCode")?;
    root.string("exampleCodeOutput")?;
    Ok(())
}

/// Image-extraction bundle
pub fn validate_extracted_code(obj: &Map<String, Value>) -> Validation {
    let root = Fields::root(obj);
    root.non_empty_string("code")?;
    root.string("detectedLanguage")?;
    Ok(())
}

/// Simulated-execution bundle
pub fn validate_simulated_execution(obj: &Map<String, Value>) -> Validation {
    let root = Fields::root(obj);
    check_steps(&root, "steps")?;
    root.string("finalOutput")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn practice_fixture() -> Value {
        json!({
            "questionText": "Print the numbers 1 to 3",
            "instructions": ["Use a loop"],
            "solutionCode": "for i in range(1, 4):\n    print(i)\n",
            "solutionOutput": "1\n2\n3\n"
        })
    }

    fn analysis_fixture() -> Value {
        json!({
            "topicExplanation": {
                "coreConcepts": "Printing",
                "blockByBlockBreakdown": "One block",
                "lineByLineBreakdown": "Line 1 prints",
                "executionFlow": "Runs once",
                "visualExecutionTrace": [
                    {
                        "lineNumber": 1,
                        "explanation": "print is called",
                        "variablesState": "{}",
                        "consoleOutput": "hi\n"
                    }
                ]
            },
            "exampleCode": "name = 'Ada'\nprint(name)\n",
            "exampleCodeOutput": "Ada\n",
            "practiceContext": {
                "generatedPractice": practice_fixture(),
                "userCodeAsPractice": practice_fixture()
            }
        })
    }

    fn remove_path(value: &mut Value, path: &[&str]) {
        let (last, parents) = path.split_last().unwrap();
        let mut current = value;
        for key in parents {
            current = current.get_mut(*key).unwrap();
        }
        current.as_object_mut().unwrap().remove(*last);
    }

    #[test]
    fn test_valid_analysis_passes() {
        assert_eq!(validate_analysis(&as_map(analysis_fixture())), Ok(()));
    }

    #[test]
    fn test_each_missing_analysis_field_is_named() {
        let cases: &[&[&str]] = &[
            &["topicExplanation"],
            &["topicExplanation", "coreConcepts"],
            &["topicExplanation", "blockByBlockBreakdown"],
            &["topicExplanation", "lineByLineBreakdown"],
            &["topicExplanation", "executionFlow"],
            &["topicExplanation", "visualExecutionTrace"],
            &["exampleCode"],
            &["exampleCodeOutput"],
            &["practiceContext"],
            &["practiceContext", "generatedPractice"],
            &["practiceContext", "userCodeAsPractice"],
            &["practiceContext", "generatedPractice", "questionText"],
            &["practiceContext", "userCodeAsPractice", "instructions"],
            &["practiceContext", "generatedPractice", "solutionCode"],
            &["practiceContext", "userCodeAsPractice", "solutionOutput"],
        ];
        for path in cases {
            let mut fixture = analysis_fixture();
            remove_path(&mut fixture, path);
            let err = validate_analysis(&as_map(fixture)).unwrap_err();
            assert_eq!(err.field, path.join("."), "wrong field for {:?}", path);
            assert_eq!(err.problem, "is missing");
        }
    }

    #[test]
    fn test_mistyped_field_reports_type() {
        let mut fixture = analysis_fixture();
        fixture["exampleCode"] = json!(42);
        let err = validate_analysis(&as_map(fixture)).unwrap_err();
        assert_eq!(err.field, "exampleCode");
        assert!(err.problem.contains("must be a string, found number"));
    }

    #[test]
    fn test_step_errors_carry_index() {
        let mut fixture = analysis_fixture();
        fixture["topicExplanation"]["visualExecutionTrace"][0]["variablesState"] = json!(7);
        let err = validate_analysis(&as_map(fixture)).unwrap_err();
        assert_eq!(
            err.field,
            "topicExplanation.visualExecutionTrace[0].variablesState"
        );
    }

    #[test]
    fn test_variables_state_may_be_object() {
        let mut fixture = analysis_fixture();
        fixture["topicExplanation"]["visualExecutionTrace"][0]["variablesState"] =
            json!({"x": 1});
        assert!(validate_analysis(&as_map(fixture)).is_ok());
    }

    #[test]
    fn test_negative_line_number_fails() {
        let mut fixture = analysis_fixture();
        fixture["topicExplanation"]["visualExecutionTrace"][0]["lineNumber"] = json!(-1);
        let err = validate_analysis(&as_map(fixture)).unwrap_err();
        assert!(err.field.ends_with("lineNumber"));
    }

    #[test]
    fn test_empty_instruction_list_fails() {
        let mut fixture = practice_fixture();
        fixture["instructions"] = json!([]);
        let err = validate_practice_question(&as_map(fixture)).unwrap_err();
        assert_eq!(err.field, "instructions");
    }

    #[test]
    fn test_blank_instruction_level_fails() {
        let mut fixture = practice_fixture();
        fixture["instructions"] = json!(["  ", ""]);
        let err = validate_practice_question(&as_map(fixture)).unwrap_err();
        assert_eq!(err.field, "instructions[0]");
        assert_eq!(err.problem, "must not be empty");

        let err = validate_hints(&as_map(json!({"instructions": ["Loop", " "]}))).unwrap_err();
        assert_eq!(err.field, "instructions[1]");
    }

    #[test]
    fn test_unwrap_single_element_array_matches_object() {
        let wrapped = unwrap_single_object(json!([analysis_fixture()])).unwrap();
        let plain = unwrap_single_object(analysis_fixture()).unwrap();
        assert_eq!(wrapped, plain);
        assert_eq!(validate_analysis(&wrapped), validate_analysis(&plain));
    }

    #[test]
    fn test_unwrap_empty_array_is_empty_response() {
        assert!(matches!(
            unwrap_single_object(json!([])),
            Err(AppError::EmptyResponse(_))
        ));
    }

    #[test]
    fn test_unwrap_rejects_multi_element_arrays_and_scalars() {
        assert!(matches!(
            unwrap_single_object(json!([{}, {}])),
            Err(AppError::SchemaValidationFailed(_))
        ));
        assert!(matches!(
            unwrap_single_object(json!("text")),
            Err(AppError::SchemaValidationFailed(_))
        ));
    }

    #[test]
    fn test_debug_validator() {
        let valid = json!({
            "summary": "One bug",
            "errors": [{
                "lineNumber": 2,
                "errorLine": "print(x",
                "errorType": "SyntaxError",
                "explanation": "Missing parenthesis",
                "suggestedFix": "print(x)"
            }],
            "correctedCode": "x = 1\nprint(x)\n"
        });
        assert!(validate_debug(&as_map(valid.clone())).is_ok());

        let mut missing = valid;
        remove_path(&mut missing, &["errors"]);
        assert_eq!(
            validate_debug(&as_map(missing)).unwrap_err().field,
            "errors"
        );

        let bad_item = json!({
            "summary": "s",
            "errors": [{"errorLine": "a", "errorType": "b", "explanation": "c"}],
            "correctedCode": "x"
        });
        assert_eq!(
            validate_debug(&as_map(bad_item)).unwrap_err().field,
            "errors[0].suggestedFix"
        );
    }

    #[test]
    fn test_project_validators() {
        let overview = json!({"overview": "A CLI", "files": [{"path": "main.py", "description": "entry"}]});
        assert!(validate_project_overview(&as_map(overview)).is_ok());
        assert_eq!(
            validate_project_overview(&as_map(json!({"files": []})))
                .unwrap_err()
                .field,
            "overview"
        );

        let deps = json!({"dependencies": [{"name": "requests", "description": "HTTP"}]});
        assert!(validate_dependencies(&as_map(deps)).is_ok());
        assert_eq!(
            validate_dependencies(&as_map(json!({"dependencies": [{"description": "x"}]})))
                .unwrap_err()
                .field,
            "dependencies[0].name"
        );

        let graph = json!({"modules": [{
            "path": "main.py", "description": "entry", "imports": ["util.py"], "importedBy": []
        }]});
        assert!(validate_module_graph(&as_map(graph)).is_ok());
        let bad_graph = json!({"modules": [{
            "path": "main.py", "description": "entry", "imports": [1], "importedBy": []
        }]});
        assert_eq!(
            validate_module_graph(&as_map(bad_graph)).unwrap_err().field,
            "modules[0].imports[0]"
        );
    }

    #[test]
    fn test_small_bundle_validators() {
        assert!(validate_hints(&as_map(json!({"instructions": ["More detail"]}))).is_ok());
        assert!(validate_hints(&as_map(json!({"instructions": []}))).is_err());

        assert!(
            validate_solution_feedback(&as_map(json!({"isCorrect": true, "feedback": "Nice"})))
                .is_ok()
        );
        assert_eq!(
            validate_solution_feedback(&as_map(json!({"isCorrect": "yes", "feedback": "x"})))
                .unwrap_err()
                .field,
            "isCorrect"
        );

        assert!(validate_example(&as_map(
            json!({"exampleCode": "print(1)", "exampleCodeOutput": "1\n"})
        ))
        .is_ok());
        assert_eq!(
            validate_example(&as_map(json!({"exampleCode": "  ", "exampleCodeOutput": ""})))
                .unwrap_err()
                .problem,
            "must not be empty"
        );

        assert!(validate_extracted_code(&as_map(
            json!({"code": "print(1)", "detectedLanguage": "python"})
        ))
        .is_ok());

        assert!(validate_simulated_execution(&as_map(json!({
            "steps": [{"explanation": "start", "variablesState": "{}"}],
            "finalOutput": ""
        })))
        .is_ok());
    }

    #[test]
    fn test_validation_error_converts_to_schema_failure() {
        let err: AppError = ValidationError {
            field: "overview".to_string(),
            problem: "is missing".to_string(),
        }
        .into();
        match err {
            AppError::SchemaValidationFailed(msg) => {
                assert_eq!(msg, "field 'overview' is missing")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
